//! Exchange Rate Cache
//!
//! Keeps the last good CLP-per-USD rate. Lifecycle:
//! `Uninitialized → Fresh → Stale → Fresh → …`
//!
//! A failed refresh never replaces the rate; it only marks the cache stale
//! once a full refresh period has gone by without a success.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use utoipa::ToSchema;

use exchange_rates::ExchangeRate;
use storefront_types::{ExchangeRateSource, RateQuote, SourceError};

use super::background::RefreshTask;
use super::single_flight::{BusyGuard, SingleFlight};
use super::status::RefreshFailure;

/// Refresh cadence of the rate service.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Still on the built-in default rate
    Uninitialized,
    Fresh,
    /// No successful refresh within the last period; the rate is still used
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateState {
    pub rate: ExchangeRate,
    pub freshness: Freshness,
    pub refreshing: bool,
    /// When this process last refreshed successfully
    #[schema(value_type = Option<String>)]
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<RefreshFailure>,
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    succeeded_at: Option<Instant>,
}

impl RateState {
    fn initial(rate: ExchangeRate) -> Self {
        Self {
            rate,
            freshness: Freshness::Uninitialized,
            refreshing: false,
            last_success: None,
            last_error: None,
            generation: 0,
            succeeded_at: None,
        }
    }
}

/// Cached exchange rate with single-flight refresh.
pub struct ExchangeRateCache<S: ExchangeRateSource> {
    source: S,
    state: watch::Sender<RateState>,
    flight: SingleFlight,
    period: Duration,
}

impl<S: ExchangeRateSource> ExchangeRateCache<S> {
    /// Creates a cache starting from the 850 CLP/USD default.
    pub fn new(source: S) -> Self {
        Self::with_default(source, ExchangeRate::fallback(), DEFAULT_REFRESH_PERIOD)
    }

    pub fn with_default(source: S, default: ExchangeRate, period: Duration) -> Self {
        Self {
            source,
            state: watch::channel(RateState::initial(default)).0,
            flight: SingleFlight::new(),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// The rate to convert with right now. Always positive.
    pub fn rate(&self) -> ExchangeRate {
        self.state.borrow().rate
    }

    pub fn state(&self) -> RateState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RateState> {
        self.state.subscribe()
    }

    /// Fetches a new rate. Manual and timer refreshes share one flight.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> RateState {
        let led = self
            .flight
            .run(|generation| async move {
                let _busy = BusyGuard::raise(&self.state, |s| &mut s.refreshing);
                let started = Instant::now();
                let result = self.source.fetch_rate().await;
                self.apply(generation, started, result);
            })
            .await;

        if led.is_none() {
            tracing::debug!("joined in-flight rate refresh");
        }
        self.state()
    }

    /// Commits a refresh outcome. `started` is when the fetch was issued, so
    /// staleness is measured between refresh starts and not skewed by latency.
    fn apply(&self, generation: u64, started: Instant, result: Result<RateQuote, SourceError>) {
        let outcome = result.and_then(|quote| {
            ExchangeRate::new(quote.clp_per_usd, quote.published_at.unwrap_or_else(Utc::now))
                .map_err(|e| SourceError::Decode(e.to_string()))
        });

        let period = self.period;
        self.state.send_modify(|state| {
            if generation <= state.generation {
                return;
            }
            state.generation = generation;
            match outcome {
                Ok(rate) => {
                    tracing::info!(rate = rate.rate(), "exchange rate refreshed");
                    state.rate = rate;
                    state.freshness = Freshness::Fresh;
                    state.last_success = Some(Utc::now());
                    state.succeeded_at = Some(started);
                    state.last_error = None;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "exchange rate refresh failed; keeping previous rate");
                    let overdue = state
                        .succeeded_at
                        .is_some_and(|at| started.duration_since(at) >= period);
                    if state.freshness == Freshness::Fresh && overdue {
                        state.freshness = Freshness::Stale;
                    }
                    state.last_error = Some(RefreshFailure::from(&err));
                }
            }
        });
    }
}

impl<S: ExchangeRateSource> ExchangeRateCache<S> {
    /// Starts the periodic refresh. The first refresh runs immediately.
    ///
    /// Dropping the returned task stops the timer.
    pub fn spawn_refresh(self: &Arc<Self>) -> RefreshTask {
        let cache = Arc::clone(self);
        RefreshTask::every(self.period, "exchange-rate", move || {
            let cache = Arc::clone(&cache);
            async move {
                cache.refresh().await;
            }
        })
    }
}
