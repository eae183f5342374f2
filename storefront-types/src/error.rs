//! Error types for the storefront.

use exchange_rates::ConversionError;

/// Domain-level errors (validation failures), surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("{field} cannot be negative, got {value}")]
    NegativeValue { field: &'static str, value: i64 },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid price range: min {min} is greater than max {max}")]
    InvalidPriceRange { min: u64, max: u64 },
}

/// Port-level errors (talking to the catalog, rate and contact services).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Upstream error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Decode failure: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] DomainError),
}

impl SourceError {
    /// Network failures and non-success HTTP statuses.
    pub fn is_transport(&self) -> bool {
        matches!(self, SourceError::Transport(_) | SourceError::Api { .. })
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Validation(e) => e.into(),
            SourceError::Api {
                status: 404,
                message,
            } => AppError::NotFound(message),
            SourceError::Api { status, message } => {
                AppError::Upstream(format!("{} - {}", status, message))
            }
            SourceError::Transport(e) => AppError::Upstream(e),
            SourceError::Decode(e) => AppError::Upstream(e),
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::NonFiniteAmount | ConversionError::AmountOutOfRange(_) => {
                AppError::BadRequest(err.to_string())
            }
            ConversionError::NonPositiveRate(_) => AppError::Internal(err.to_string()),
        }
    }
}
