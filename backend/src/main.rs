mod config;
mod contracts;
mod db;
mod error;
mod notify;
mod pdf;
mod pipeline;
mod services;
mod signature;
mod state;
mod templates;

use crate::config::AppConfig;
use crate::contracts::FsContractStore;
use crate::notify::{DisabledNotifier, Notifier, SmtpNotifier};
use crate::pdf::GenpdfRenderer;
use crate::pipeline::{ContractPipeline, PipelineSettings};
use crate::signature::FsSignatureStore;
use crate::state::AppState;
use crate::templates::{SqliteTemplateStore, TemplateSelection, TemplateStore, DEFAULT_TEMPLATE_HTML, DEFAULT_TEMPLATE_NAME};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::{error, info, warn};
use mime_guess::from_path;
use std::io;
use std::sync::Arc;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static");

async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let file_path = if path.is_empty() { "index.html" } else { path };

    match STATIC_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => HttpResponse::NotFound().body("Not Found"),
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::other(format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    let db_path = config.database_path();
    db::init_schema(&db_path).map_err(|e| startup_error("Could not initialise the database", e))?;

    let templates = Arc::new(SqliteTemplateStore::new(&db_path));
    if templates
        .seed(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE_HTML)
        .map_err(|e| startup_error("Could not seed the default template", e))?
    {
        info!("Seeded template \"{}\"", DEFAULT_TEMPLATE_NAME);
    }
    let selected = templates
        .selected()
        .map_err(|e| startup_error("Could not read the template selection", e))?
        .unwrap_or_else(|| config.default_template.clone());
    match templates.get(&selected) {
        Ok(Some(_)) => info!("Contracts are generated from template \"{}\"", selected),
        _ => warn!("Selected template \"{}\" is not stored; submissions will fail until one is uploaded", selected),
    }
    let selection = TemplateSelection::new(selected);

    let signatures = Arc::new(
        FsSignatureStore::new(config.signatures_dir())
            .map_err(|e| startup_error("Could not prepare the signature directory", e))?,
    );
    let contracts = Arc::new(
        FsContractStore::new(config.contracts_dir(), &db_path)
            .map_err(|e| startup_error("Could not prepare the contract directory", e))?,
    );
    let renderer = Arc::new(
        GenpdfRenderer::new(&config.fonts_dir, &config.font_family)
            .map_err(|e| startup_error("Could not load fonts", e))?,
    );

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(
            SmtpNotifier::new(smtp, &config.mail_from)
                .map_err(|e| startup_error("Could not configure SMTP", e))?,
        ),
        None => {
            warn!("SMTP_HOST is not set: contracts will be generated but not emailed");
            Arc::new(DisabledNotifier)
        }
    };
    info!("Signature retention policy: {}", config.signature_retention);
    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set: the admin endpoints are open to anyone");
    }

    let pipeline = ContractPipeline::new(
        templates.clone(),
        selection.clone(),
        signatures,
        contracts.clone(),
        renderer,
        notifier,
        PipelineSettings {
            admin_email: config.admin_email.clone(),
            signature_retention: config.signature_retention,
            page_size: config.page_size,
            orientation: config.orientation,
        },
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        templates,
        selection,
        contracts,
        admin_token: config.admin_token.clone(),
        max_upload_bytes: config.max_upload_bytes,
    };

    info!("Server running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(64 * 1024))
            .app_data(web::Data::new(state.clone()))
            .service(services::contracts::configure_routes())
            .service(services::templates::configure_routes())
            .default_service(web::route().to(serve_embedded))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_web::test]
    async fn form_page_and_script_are_embedded() {
        let app = test::init_service(App::new().default_service(web::route().to(serve_embedded))).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("contract-form-slot"));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/canvas.js").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("javascript")));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/missing.txt").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
