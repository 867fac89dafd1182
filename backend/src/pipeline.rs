//! # Contract Generation Pipeline
//!
//! Turns one form submission into one persisted contract.
//!
//! ## Workflow
//!
//! 1.  **Validating**: the text fields must be present, the email must be an
//!     address and the date an ISO calendar date. Nothing is written before
//!     this stage passes.
//! 2.  **ResolvingSignature**: exactly one signature source is accepted,
//!     decoded and written to the signature store (see `signature`).
//! 3.  **Rendering**: the currently selected template is loaded and its tokens
//!     substituted (see `templates::render`).
//! 4.  **ConvertingToPdf**: the HTML is handed to the `PdfRenderer` on a
//!     blocking thread. Failures are final; rendering is deterministic.
//! 5.  **Persisting**: the PDF is stored under the submission's contract id.
//! 6.  **Notifying**: the PDF is emailed to the administrator. A failed
//!     delivery is logged and recorded but does not undo the contract.
//!
//! Once the stored signature exists it is owned by a `SignatureCleanup` guard,
//! which removes or keeps it according to the configured `SignatureRetention`
//! when generation ends, whether by success, error or a dropped request.

use crate::contracts::{Contract, ContractId, ContractStore};
use crate::error::ContractError;
use crate::notify::{Attachment, Notification, Notifier};
use crate::pdf::{Orientation, PageSize, PdfRenderer};
use crate::signature::{
    self, SignatureHandle, SignatureInput, SignatureRetention, SignatureSource, SignatureStore, StoredSignature,
};
use crate::templates::{self, ContractFields, TemplateSelection, TemplateStore};
use chrono::{NaiveDate, Utc};
use common::model::contract::GenerationStatus;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;

const MAX_NAME_CHARS: usize = 200;

/// One form post, exactly as received.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
    pub signature: SignatureInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ResolvingSignature,
    Rendering,
    ConvertingToPdf,
    Persisting,
    Notifying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::ResolvingSignature => "resolving signature",
            Stage::Rendering => "rendering",
            Stage::ConvertingToPdf => "converting to pdf",
            Stage::Persisting => "persisting",
            Stage::Notifying => "notifying",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    Sent,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub contract: Contract,
    pub notification: NotificationStatus,
}

impl GenerationOutcome {
    pub fn status(&self) -> GenerationStatus {
        match self.notification {
            NotificationStatus::Sent => GenerationStatus::GeneratedAndNotified,
            NotificationStatus::Failed(_) => GenerationStatus::Generated,
        }
    }
}

/// Settings the pipeline needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub admin_email: String,
    pub signature_retention: SignatureRetention,
    pub page_size: PageSize,
    pub orientation: Orientation,
}

pub struct ContractPipeline {
    templates: Arc<dyn TemplateStore>,
    selection: TemplateSelection,
    signatures: Arc<dyn SignatureStore>,
    contracts: Arc<dyn ContractStore>,
    renderer: Arc<dyn PdfRenderer>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl ContractPipeline {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        selection: TemplateSelection,
        signatures: Arc<dyn SignatureStore>,
        contracts: Arc<dyn ContractStore>,
        renderer: Arc<dyn PdfRenderer>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            templates,
            selection,
            signatures,
            contracts,
            renderer,
            notifier,
            settings,
        }
    }

    pub async fn generate(&self, submission: Submission) -> Result<GenerationOutcome, ContractError> {
        let id = ContractId::generate();

        enter(&id, Stage::Validating);
        let fields = validate(&submission).map_err(|e| fail(&id, Stage::Validating, e))?;

        enter(&id, Stage::ResolvingSignature);
        let stored = SignatureSource::from_input(submission.signature)
            .and_then(|source| signature::resolve(source, self.signatures.as_ref()))
            .map_err(|e| fail(&id, Stage::ResolvingSignature, e))?;

        let _cleanup = SignatureCleanup {
            store: Arc::clone(&self.signatures),
            handle: stored.handle.clone(),
            retention: self.settings.signature_retention,
            id: id.clone(),
        };
        self.generate_with_signature(&id, &fields, &stored).await
    }

    async fn generate_with_signature(
        &self,
        id: &ContractId,
        fields: &ContractFields,
        stored: &StoredSignature,
    ) -> Result<GenerationOutcome, ContractError> {
        enter(id, Stage::Rendering);
        let template_name = self.selection.current().await;
        let template = self
            .templates
            .get(&template_name)
            .map_err(|e| ContractError::PersistenceError(e.to_string()))
            .and_then(|found| found.ok_or_else(|| ContractError::TemplateNotFound(template_name.clone())))
            .map_err(|e| fail_in(id, &template_name, Stage::Rendering, e))?;
        let html = templates::render(&template, fields, stored);

        enter(id, Stage::ConvertingToPdf);
        let renderer = Arc::clone(&self.renderer);
        let (page_size, orientation) = (self.settings.page_size, self.settings.orientation);
        let pdf_bytes = tokio::task::spawn_blocking(move || renderer.render(&html, page_size, orientation))
            .await
            .map_err(|e| ContractError::RenderingFailed(format!("render task join error: {e}")))
            .and_then(|rendered| rendered.map_err(|e| ContractError::RenderingFailed(e.to_string())))
            .map_err(|e| fail_in(id, &template_name, Stage::ConvertingToPdf, e))?;

        enter(id, Stage::Persisting);
        let contract = Contract {
            id: id.clone(),
            pdf_bytes,
            generated_at: Utc::now(),
            template: template_name.clone(),
        };
        self.contracts
            .put(&contract)
            .map_err(|e| fail_in(id, &template_name, Stage::Persisting, e.into()))?;
        info!(
            "[{}] Contract generated from template \"{}\" ({} bytes)",
            id,
            template_name,
            contract.pdf_bytes.len()
        );

        enter(id, Stage::Notifying);
        let notification = self.notify(&contract, fields).await;

        enter(id, Stage::Done);
        Ok(GenerationOutcome {
            contract,
            notification,
        })
    }

    async fn notify(&self, contract: &Contract, fields: &ContractFields) -> NotificationStatus {
        let notification = Notification {
            to: self.settings.admin_email.clone(),
            subject: "Signed Contract".to_string(),
            body: format!(
                "Please find the attached signed contract.\n\n\
                 Signed by: {}\nEmail: {}\nDate: {}\nReference: {}\n",
                fields.fullname,
                fields.email,
                fields.date.format("%Y-%m-%d"),
                contract.id
            ),
            attachments: vec![Attachment {
                filename: format!("contract-{}.pdf", contract.id),
                content_type: "application/pdf".to_string(),
                bytes: contract.pdf_bytes.clone(),
            }],
        };

        let status = match self.notifier.send(&notification).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                let failure = ContractError::NotificationFailed(e.to_string());
                error!(
                    "[{}] {} (notifier: {}); the contract is kept",
                    contract.id,
                    failure,
                    self.notifier.name()
                );
                NotificationStatus::Failed(e.to_string())
            }
        };

        let outcome = match &status {
            NotificationStatus::Sent => Ok(()),
            NotificationStatus::Failed(reason) => Err(reason.as_str()),
        };
        if let Err(e) = self.contracts.record_notification(&contract.id, outcome) {
            warn!("[{}] Could not record notification outcome: {}", contract.id, e);
        }
        status
    }
}

/// Applies the retention policy to one stored signature when dropped.
struct SignatureCleanup {
    store: Arc<dyn SignatureStore>,
    handle: SignatureHandle,
    retention: SignatureRetention,
    id: ContractId,
}

impl Drop for SignatureCleanup {
    fn drop(&mut self) {
        match self.retention {
            SignatureRetention::Keep => {
                debug!("[{}] Keeping signature {}", self.id, self.handle);
            }
            SignatureRetention::Delete => {
                if let Err(e) = self.store.delete(&self.handle) {
                    warn!("[{}] Could not delete signature {}: {}", self.id, self.handle, e);
                }
            }
        }
    }
}

fn enter(id: &ContractId, stage: Stage) {
    debug!("[{}] {}", id, stage);
}

fn fail(id: &ContractId, stage: Stage, err: ContractError) -> ContractError {
    if err.is_user_error() {
        info!("[{}] Submission rejected while {}: {}", id, stage, err);
    } else {
        error!("[{}] Failed while {}: {}", id, stage, err);
    }
    err
}

fn fail_in(id: &ContractId, template: &str, stage: Stage, err: ContractError) -> ContractError {
    if err.is_user_error() {
        info!("[{}] Submission rejected while {} (template \"{}\"): {}", id, stage, template, err);
    } else {
        error!("[{}] Failed while {} (template \"{}\"): {}", id, stage, template, err);
    }
    err
}

fn required(value: &Option<String>, label: &str) -> Result<String, ContractError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ContractError::InvalidInput(format!("{label} is required."))),
    }
}

/// Checks the text fields of a submission.
pub fn validate(submission: &Submission) -> Result<ContractFields, ContractError> {
    let fullname = required(&submission.fullname, "Full name")?;
    let email = required(&submission.email, "Email")?;
    let date = required(&submission.date, "Date")?;

    if fullname.chars().count() > MAX_NAME_CHARS {
        return Err(ContractError::InvalidInput(format!(
            "Full name must be at most {MAX_NAME_CHARS} characters."
        )));
    }
    if email.parse::<lettre::Address>().is_err() {
        return Err(ContractError::InvalidInput(format!(
            "\"{email}\" is not a valid email address."
        )));
    }
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
        ContractError::InvalidInput(format!("\"{date}\" is not a valid date (expected YYYY-MM-DD)."))
    })?;

    Ok(ContractFields {
        fullname,
        email,
        date,
    })
}
