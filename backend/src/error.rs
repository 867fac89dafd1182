use thiserror::Error;

/// Every way a contract submission can end without a contract.
///
/// The first five variants are caused by the submission itself and their
/// message is shown to the user as-is. `RenderingFailed` and
/// `PersistenceError` are system faults: the detail goes to the log and the
/// user gets a generic message. `NotificationFailed` never aborts a request;
/// it is produced only to describe a failed delivery in logs and stats.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    MissingSignature(String),
    #[error("Please provide either an uploaded signature or a drawn one, not both.")]
    AmbiguousSignature,
    #[error("The drawn signature could not be read: {0}")]
    SignatureDecodeError(String),
    #[error("The contract template \"{0}\" is not available.")]
    TemplateNotFound(String),
    #[error("PDF rendering failed: {0}")]
    RenderingFailed(String),
    #[error("persistence error: {0}")]
    PersistenceError(String),
    #[error("notification failed: {0}")]
    NotificationFailed(String),
}

const GENERIC_FAILURE: &str = "We could not generate your contract. Please try again later.";

impl ContractError {
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::MissingSignature(_)
                | Self::AmbiguousSignature
                | Self::SignatureDecodeError(_)
                | Self::TemplateNotFound(_)
        )
    }

    /// Text safe to show to the person who submitted the form.
    pub fn user_message(&self) -> String {
        if self.is_user_error() {
            self.to_string()
        } else {
            GENERIC_FAILURE.to_string()
        }
    }
}

/// Failure of a storage collaborator (templates, signatures or contracts).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

impl From<StoreError> for ContractError {
    fn from(err: StoreError) -> Self {
        ContractError::PersistenceError(err.to_string())
    }
}
