//! # Contract Service Module
//!
//! Routes under `/api/contracts`.
//!
//! - `GET /form`: the blank form fragment.
//! - `POST /generate`: multipart submission, answered with the form fragment
//!   and a notice (see `generate`).
//! - `GET /stats`: admin counters for a time window.
//! - `GET /{id}`: the stored PDF.
//! - `GET /{id}/summary`: admin metadata of one contract.

mod download;
mod form;
mod generate;
mod stats;
mod summary;
mod view;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for contract routes.
const API_PATH: &str = "/api/contracts";

/// Configures the Actix `Scope` for contract submission and retrieval.
///
/// # Registered Routes:
///
/// *   **`GET /form`**:
///     - **Handler**: `form::process`
///     - **Description**: Returns the blank contract form as an HTML fragment for the page to insert.
///
/// *   **`POST /generate`**:
///     - **Handler**: `generate::process`
///     - **Description**: Takes the multipart submission (`fullname`, `email`, `date` and either
///       `signatureUpload` or `signatureData`), runs the contract pipeline and answers with the
///       form fragment and a success or error notice.
///
/// *   **`GET /stats`**:
///     - **Handler**: `stats::process`
///     - **Description**: Admin only. Counts contracts and notification failures generated
///       between the RFC 3339 `from` and `to` query parameters.
///
/// *   **`GET /{id}/summary`**:
///     - **Handler**: `summary::process`
///     - **Description**: Admin only. Returns the stored metadata of one contract as a
///       `ContractSummary`.
///
/// *   **`GET /{id}`**:
///     - **Handler**: `download::process`
///     - **Description**: Serves the generated PDF of the contract inline.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/form", get().to(form::process))
        .route("/generate", post().to(generate::process))
        .route("/stats", get().to(stats::process))
        .route("/{id}/summary", get().to(summary::process))
        .route("/{id}", get().to(download::process))
}
