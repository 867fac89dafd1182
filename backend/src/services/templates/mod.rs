//! # Template Service Module
//!
//! Administrative routes under `/api/templates`. All of them go through
//! `admin::authorize`.
//!
//! - `GET /`: list of `TemplateSummary`, the live selection marked.
//! - `POST /upload`: multipart `name` + `file` (`.html`), creates or replaces.
//! - `GET /selected`: the template new contracts are generated from.
//! - `PUT /selected`: JSON `SelectTemplateRequest`; `404` for unknown names.

mod list;
mod selected;
mod upload;

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

/// The base path for template administration.
const API_PATH: &str = "/api/templates";

/// Configures the Actix `Scope` for template administration.
///
/// # Registered Routes:
///
/// *   **`GET /`**:
///     - **Handler**: `list::process`
///     - **Description**: Lists every stored template as a `TemplateSummary`, with the one
///       new contracts are generated from marked as selected.
///
/// *   **`POST /upload`**:
///     - **Handler**: `upload::process`
///     - **Description**: Stores the `.html` file of a multipart form under the given `name`,
///       replacing a template of the same name. Parts other than `name` and `file` are ignored.
///
/// *   **`GET /selected`**:
///     - **Handler**: `selected::get`
///     - **Description**: Returns the name of the selected template as a `SelectTemplateRequest`.
///
/// *   **`PUT /selected`**:
///     - **Handler**: `selected::put`
///     - **Description**: Switches the selected template and persists the choice. Unknown names
///       answer `404` and leave the selection unchanged.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/upload", post().to(upload::process))
        .route("/selected", get().to(selected::get))
        .route("/selected", put().to(selected::put))
}
