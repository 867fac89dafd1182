use serde::{Deserialize, Serialize};

/// Distinguishes a contract that was only generated from one that was also
/// delivered to the administrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GenerationStatus {
    Generated,
    GeneratedAndNotified,
}

/// Metadata describing a generated contract, without its PDF bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractSummary {
    pub id: String,
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub template: String,
    pub status: GenerationStatus,
}

/// Usage counters for a time window, served to the admin reporting surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractStats {
    pub generated: u64,
    pub notified: u64,
    pub notification_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize_with_field_names() {
        let stats = ContractStats {
            generated: 3,
            notified: 2,
            notification_failures: 1,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["generated"], 3);
        assert_eq!(json["notification_failures"], 1);
    }

    #[test]
    fn status_serializes_as_variant_name() {
        let json = serde_json::to_string(&GenerationStatus::GeneratedAndNotified).unwrap();
        assert_eq!(json, "\"GeneratedAndNotified\"");
    }
}
