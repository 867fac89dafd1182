//! # Contract Download Service
//!
//! `GET /api/contracts/{id}` serves a stored PDF inline. Identifiers that
//! could not have been generated are answered with `404` before the store is
//! touched.

use crate::contracts::ContractId;
use crate::state::AppState;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use log::error;

pub async fn process(state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    let Some(id) = ContractId::parse(&id) else {
        return HttpResponse::NotFound().body("Contract not found");
    };

    match state.contracts.get(&id) {
        Ok(Some(bytes)) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Inline,
                parameters: vec![DispositionParam::Filename(format!("contract-{}.pdf", id))],
            })
            .body(bytes),
        Ok(None) => HttpResponse::NotFound().body("Contract not found"),
        Err(e) => {
            error!("[{}] Could not read contract: {}", id, e);
            HttpResponse::InternalServerError().body("Could not read the contract")
        }
    }
}
