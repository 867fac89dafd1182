use serde::{Deserialize, Serialize};

/// One entry of the template listing returned by `GET /api/templates`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateSummary {
    pub name: String,
    /// RFC 3339 timestamp of the last upload.
    pub uploaded_at: String,
    /// Whether this is the template new contracts are generated from.
    pub selected: bool,
}
