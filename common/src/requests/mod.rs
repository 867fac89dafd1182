use serde::{Deserialize, Serialize};

/// Request payload for `PUT /api/templates/selected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectTemplateRequest {
    pub name: String,
}

/// Query string of `GET /api/contracts/stats`.
/// Both bounds are RFC 3339 timestamps; `from` is inclusive, `to` exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsQuery {
    pub from: String,
    pub to: String,
}
