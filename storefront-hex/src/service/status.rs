//! Refresh status shared by the catalog store and the rate cache.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use storefront_types::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Transport,
    Decode,
}

/// A background refresh that did not produce new data.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RefreshFailure {
    pub kind: FailureKind,
    pub message: String,
    #[schema(value_type = String)]
    pub at: DateTime<Utc>,
}

impl RefreshFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

impl From<&SourceError> for RefreshFailure {
    fn from(err: &SourceError) -> Self {
        let kind = if err.is_transport() {
            FailureKind::Transport
        } else {
            FailureKind::Decode
        };
        Self::new(kind, err.to_string())
    }
}
