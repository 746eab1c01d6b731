use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl BillingError {
    /// Stable identifier the transport layer hands to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::Validation(_) => "validation_error",
            BillingError::NotFound(_) => "not_found",
            BillingError::Conflict(_) => "conflict",
            BillingError::Persistence(_) => "persistence_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::Validation(_) => StatusCode::BAD_REQUEST,
            BillingError::NotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Conflict(_) => StatusCode::CONFLICT,
            BillingError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;
