use super::view::{render_form, FormValues};
use actix_web::{HttpResponse, Responder};

/// `GET /api/contracts/form`: the blank form fragment.
pub async fn process() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_form(&FormValues::default(), None))
}
