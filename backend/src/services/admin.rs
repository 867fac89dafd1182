use crate::state::AppState;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use log::warn;
use subtle::ConstantTimeEq;

/// Checks the `Authorization: Bearer` header against the configured admin token.
/// Without a configured token every request is let through.
pub fn authorize(req: &HttpRequest, state: &AppState) -> Result<(), HttpResponse> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Ok(());
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if tokens_match(token, expected) => Ok(()),
        _ => {
            warn!("Rejected admin request to {}", req.path());
            Err(HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .body("Unauthorized"))
        }
    }
}

/// Compares in time independent of where the tokens differ; only the length leaks.
fn tokens_match(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
