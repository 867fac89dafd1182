//! # Template Selection Service
//!
//! `GET /api/templates/selected` reports the template new contracts use.
//! `PUT /api/templates/selected` switches it: the name must exist in the
//! store, the choice is persisted first and then published to the running
//! pipeline, so a failed write leaves the old selection in place.

use crate::services::admin::authorize;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::requests::SelectTemplateRequest;
use log::{error, info};

pub async fn get(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    if let Err(denied) = authorize(&req, &state) {
        return denied;
    }
    HttpResponse::Ok().json(SelectTemplateRequest {
        name: state.selection.current().await,
    })
}

pub async fn put(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<SelectTemplateRequest>,
) -> impl Responder {
    if let Err(denied) = authorize(&req, &state) {
        return denied;
    }
    let name = payload.into_inner().name;

    match state.templates.get(&name) {
        Ok(Some(_)) => {}
        Ok(None) => return HttpResponse::NotFound().body(format!("Template \"{}\" not found", name)),
        Err(e) => {
            error!("Could not look up template \"{}\": {}", name, e);
            return HttpResponse::ServiceUnavailable().body(format!("Error reading templates: {}", e));
        }
    }

    if let Err(e) = state.templates.set_selected(&name) {
        error!("Could not persist template selection \"{}\": {}", name, e);
        return HttpResponse::ServiceUnavailable().body(format!("Error saving selection: {}", e));
    }
    let previous = state.selection.select(name.clone()).await;
    info!("Selected template changed from \"{}\" to \"{}\"", previous, name);

    HttpResponse::Ok().json(SelectTemplateRequest { name })
}
