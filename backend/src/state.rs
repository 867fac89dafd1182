//! Application state shared by every HTTP worker.
//!
//! `AppState` is built once in `main.rs` and handed to Actix as `web::Data`.
//! Clones are cheap: every collaborator sits behind an `Arc`, and the template
//! selection is the same `Arc<RwLock>` the pipeline reads from.

use crate::contracts::ContractStore;
use crate::pipeline::ContractPipeline;
use crate::templates::{TemplateSelection, TemplateStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ContractPipeline>,
    pub templates: Arc<dyn TemplateStore>,
    pub selection: TemplateSelection,
    pub contracts: Arc<dyn ContractStore>,
    /// Bearer token guarding the admin endpoints. `None` leaves them open.
    pub admin_token: Option<String>,
    /// Upper bound for a single multipart part, in bytes.
    pub max_upload_bytes: usize,
}
