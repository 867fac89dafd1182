use crate::contracts::ContractId;
use crate::services::admin::authorize;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::error;

/// `GET /api/contracts/{id}/summary`: metadata of one contract, for administrators.
pub async fn process(req: HttpRequest, state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    if let Err(denied) = authorize(&req, &state) {
        return denied;
    }
    let Some(id) = ContractId::parse(&id) else {
        return HttpResponse::NotFound().body("Contract not found");
    };

    match state.contracts.summary(&id) {
        Ok(Some(summary)) => HttpResponse::Ok().json(summary),
        Ok(None) => HttpResponse::NotFound().body("Contract not found"),
        Err(e) => {
            error!("[{}] Could not read contract summary: {}", id, e);
            HttpResponse::InternalServerError().body("Could not read the contract")
        }
    }
}
