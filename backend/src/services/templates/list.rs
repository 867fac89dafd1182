use crate::services::admin::authorize;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::error;

/// `GET /api/templates`: every stored template, with the one in use marked.
///
/// The mark follows the live selection, which may still be the configured
/// default when no administrator has picked a template yet.
pub async fn process(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    if let Err(denied) = authorize(&req, &state) {
        return denied;
    }

    let current = state.selection.current().await;
    match state.templates.list() {
        Ok(mut templates) => {
            for template in &mut templates {
                template.selected = template.name == current;
            }
            HttpResponse::Ok().json(templates)
        }
        Err(e) => {
            error!("Could not list templates: {}", e);
            HttpResponse::ServiceUnavailable().body(format!("Error listing templates: {}", e))
        }
    }
}
