//! Exchange rate provider port.

use std::sync::Arc;

use crate::dto::RateQuote;
use crate::error::SourceError;

/// Port trait for the external exchange-rate service.
#[async_trait::async_trait]
pub trait ExchangeRateSource: Send + Sync + 'static {
    /// Fetches the current CLP-per-USD quote.
    async fn fetch_rate(&self) -> Result<RateQuote, SourceError>;
}

#[async_trait::async_trait]
impl<T: ExchangeRateSource + ?Sized> ExchangeRateSource for Arc<T> {
    async fn fetch_rate(&self) -> Result<RateQuote, SourceError> {
        (**self).fetch_rate().await
    }
}
