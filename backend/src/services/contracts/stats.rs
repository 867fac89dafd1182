//! # Contract Statistics Service
//!
//! `GET /api/contracts/stats?from=<rfc3339>&to=<rfc3339>` returns the
//! `ContractStats` counters for contracts generated in `[from, to)`.

use crate::services::admin::authorize;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use common::requests::StatsQuery;
use log::error;

pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<StatsQuery>,
) -> impl Responder {
    if let Err(denied) = authorize(&req, &state) {
        return denied;
    }

    let (from, to) = match (parse_bound(&query.from), parse_bound(&query.to)) {
        (Ok(from), Ok(to)) if from <= to => (from, to),
        (Ok(_), Ok(_)) => return HttpResponse::BadRequest().body("`from` must not be after `to`"),
        (Err(e), _) | (_, Err(e)) => return HttpResponse::BadRequest().body(e),
    };

    match state.contracts.stats(from, to) {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            error!("Could not compute contract stats: {}", e);
            HttpResponse::InternalServerError().body("Could not compute statistics")
        }
    }
}

fn parse_bound(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| format!("{raw:?} is not an RFC 3339 timestamp"))
}

#[cfg(test)]
mod tests {
    use crate::contracts::{Contract, ContractId};
    use crate::services::test_support::app_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use chrono::{TimeZone, Utc};
    use common::model::contract::ContractStats;

    #[actix_web::test]
    async fn stats_cover_the_requested_window() {
        let app = app_state(Some("s3cret"));
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let contract = Contract {
            id: ContractId::generate(),
            pdf_bytes: b"%PDF".to_vec(),
            generated_at: at,
            template: "default".to_string(),
        };
        app.state.contracts.put(&contract).unwrap();
        app.state.contracts.record_notification(&contract.id, Ok(())).unwrap();

        let service = test::init_service(
            App::new()
                .app_data(web::Data::new(app.state.clone()))
                .service(crate::services::contracts::configure_routes()),
        )
        .await;

        let uri = "/api/contracts/stats?from=2024-05-01T00:00:00Z&to=2024-05-02T00:00:00Z";
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", "Bearer s3cret"))
            .to_request();
        let stats: ContractStats = test::call_and_read_body_json(&service, req).await;
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.notified, 1);

        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn malformed_bounds_are_rejected() {
        let app = app_state(None);
        let service = test::init_service(
            App::new()
                .app_data(web::Data::new(app.state.clone()))
                .service(crate::services::contracts::configure_routes()),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/contracts/stats?from=yesterday&to=2024-05-02T00:00:00Z")
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
