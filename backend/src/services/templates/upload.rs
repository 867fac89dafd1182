//! # Template Upload Service
//!
//! `POST /api/templates/upload` stores an HTML template from a multipart form
//! with two parts: `name` (letters, digits, `-`, `_`) and `file` (an `.html`
//! document, UTF-8). Uploading an existing name replaces that template; the
//! selection is left alone.

use crate::services::admin::authorize;
use crate::services::multipart::{read_form, FormLimits};
use crate::state::AppState;
use crate::templates::is_valid_template_name;
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};

const FIELDS: [&str; 2] = ["name", "file"];

pub async fn process(req: HttpRequest, state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    if let Err(denied) = authorize(&req, &state) {
        return denied;
    }

    let limits = FormLimits::for_fields(&FIELDS, state.max_upload_bytes);
    let parts = match read_form(payload, &FIELDS, limits).await {
        Ok(parts) => parts,
        Err(e) => return HttpResponse::BadRequest().body(format!("Error: {}", e)),
    };

    let name = match parts.text("name") {
        Ok(name) => name.map(|n| n.trim().to_string()).unwrap_or_default(),
        Err(e) => return HttpResponse::BadRequest().body(format!("Error: {}", e)),
    };
    if !is_valid_template_name(&name) {
        return HttpResponse::BadRequest()
            .body("Error: the template name may only contain letters, digits, '-' and '_'");
    }

    let Some(file) = parts.get("file") else {
        return HttpResponse::BadRequest().body("Error: missing template file");
    };
    let filename = file.filename.clone().unwrap_or_default();
    if !filename.to_ascii_lowercase().ends_with(".html") {
        return HttpResponse::BadRequest().body("Error: the file must end with .html");
    }
    let html = match file.text() {
        Ok(html) => html,
        Err(_) => return HttpResponse::BadRequest().body("Error: the template is not valid UTF-8"),
    };

    match state.templates.put(&name, &html) {
        Ok(()) => {
            info!("Template \"{}\" uploaded ({} bytes)", name, html.len());
            HttpResponse::Ok().body(format!("Template \"{}\" saved", name))
        }
        Err(e) => {
            error!("Could not save template \"{}\": {}", name, e);
            HttpResponse::ServiceUnavailable().body(format!("Error saving template: {}", e))
        }
    }
}
