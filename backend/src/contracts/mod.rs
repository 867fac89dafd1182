//! Generated contracts and their storage.

mod store;

pub use store::{ContractStore, FsContractStore};

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Identity of one contract: a microsecond UTC timestamp followed by 48 random bits,
/// e.g. `20240501093015123456-3f9c1a0b7e2d`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractId(String);

impl ContractId {
    pub fn generate() -> Self {
        let now = Utc::now();
        let random = Uuid::new_v4().simple().to_string();
        ContractId(format!("{}-{}", now.format("%Y%m%d%H%M%S%6f"), &random[..12]))
    }

    /// Accepts identifiers coming from URLs; only the characters `generate` emits are allowed.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= 64
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c) || c == '-');
        valid.then(|| ContractId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A generated contract. Never modified once persisted.
#[derive(Debug, Clone)]
pub struct Contract {
    pub id: ContractId,
    pub pdf_bytes: Vec<u8>,
    pub generated_at: DateTime<Utc>,
    pub template: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ten_thousand_ids_are_distinct() {
        let ids: HashSet<ContractId> = (0..10_000).map(|_| ContractId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn generated_ids_parse_back() {
        let id = ContractId::generate();
        assert_eq!(id.as_str().len(), 20 + 1 + 12);
        assert_eq!(ContractId::parse(id.as_str()), Some(id));
    }

    #[test]
    fn path_like_ids_are_rejected() {
        assert_eq!(ContractId::parse("../etc/passwd"), None);
        assert_eq!(ContractId::parse(""), None);
        assert_eq!(ContractId::parse("ABC"), None);
    }
}
