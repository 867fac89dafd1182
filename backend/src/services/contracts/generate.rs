//! # Contract Submission Service
//!
//! `POST /api/contracts/generate`: reads the multipart form, hands it to the
//! pipeline and answers with the re-rendered form fragment.
//!
//! - `200 OK`: contract generated; blank form plus a success notice.
//! - `400 Bad Request`: the submission was rejected; the user's values are
//!   echoed back with the reason.
//! - `500 Internal Server Error`: a system fault; the user sees a generic
//!   message, the detail is in the log.

use super::view::{render_form, FormValues, Notice};
use crate::pipeline::Submission;
use crate::services::multipart::{read_form, FormError, FormLimits, FormParts};
use crate::signature::{SignatureInput, UploadedFile};
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};

const FIELDS: [&str; 5] = ["fullname", "email", "date", "signatureUpload", "signatureData"];

pub async fn process(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let limits = FormLimits::for_fields(&FIELDS, state.max_upload_bytes);
    let submission = match read_form(payload, &FIELDS, limits).await.and_then(submission_from) {
        Ok(submission) => submission,
        Err(e) => {
            warn!("Unreadable contract submission: {}", e);
            let message = match e {
                FormError::Malformed(_) => "The submitted form could not be read.".to_string(),
                _ => capitalize(&e.to_string()),
            };
            return fragment(HttpResponse::BadRequest(), &FormValues::default(), Notice::Error(message));
        }
    };

    let echoed = FormValues {
        fullname: submission.fullname.clone().unwrap_or_default(),
        email: submission.email.clone().unwrap_or_default(),
        date: submission.date.clone().unwrap_or_default(),
    };

    match state.pipeline.generate(submission).await {
        Ok(outcome) => {
            info!(
                "[{}] Submission completed with status {:?}",
                outcome.contract.id,
                outcome.status()
            );
            let notice = Notice::Success {
                contract_id: outcome.contract.id.to_string(),
            };
            fragment(HttpResponse::Ok(), &FormValues::default(), notice)
        }
        Err(e) => {
            let builder = if e.is_user_error() {
                HttpResponse::BadRequest()
            } else {
                HttpResponse::InternalServerError()
            };
            fragment(builder, &echoed, Notice::Error(e.user_message()))
        }
    }
}

fn fragment(
    mut builder: actix_web::HttpResponseBuilder,
    values: &FormValues,
    notice: Notice,
) -> HttpResponse {
    builder
        .content_type("text/html; charset=utf-8")
        .body(render_form(values, Some(&notice)))
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

fn submission_from(mut parts: FormParts) -> Result<Submission, FormError> {
    let upload = parts.take("signatureUpload").map(|part| UploadedFile {
        filename: part.filename.unwrap_or_default(),
        bytes: part.bytes,
    });

    Ok(Submission {
        fullname: parts.text("fullname")?,
        email: parts.text("email")?,
        date: parts.text("date")?,
        signature: SignatureInput {
            upload,
            drawn: parts.text("signatureData")?,
        },
    })
}
