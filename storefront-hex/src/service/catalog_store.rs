//! Catalog Store
//!
//! Holds the latest product snapshot and reloads it from the catalog port.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use utoipa::ToSchema;

use storefront_types::{CatalogSnapshot, CatalogSource, Product, SourceError};

use super::single_flight::{BusyGuard, SingleFlight};
use super::status::RefreshFailure;

/// Observable outcome of catalog loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    pub loading: bool,
    /// Version of the snapshot currently served
    pub version: u64,
    pub product_count: usize,
    /// Products with malformed fields in the current snapshot
    pub flagged_count: usize,
    #[schema(value_type = Option<String>)]
    pub last_success: Option<DateTime<Utc>>,
    /// Set by a failed load, cleared by the next successful one
    pub last_error: Option<RefreshFailure>,
}

/// Snapshot holder for the product catalog.
///
/// `load()` never fails: errors are recorded in [`CatalogStatus`] and the
/// previous snapshot keeps being served.
pub struct CatalogStore<S: CatalogSource> {
    source: S,
    snapshot: watch::Sender<Arc<CatalogSnapshot>>,
    status: watch::Sender<CatalogStatus>,
    flight: SingleFlight,
}

impl<S: CatalogSource> CatalogStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: watch::channel(Arc::new(CatalogSnapshot::empty())).0,
            status: watch::channel(CatalogStatus::default()).0,
            flight: SingleFlight::new(),
        }
    }

    /// Returns a reference to the underlying catalog port.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The last successfully loaded snapshot (empty before the first load).
    pub fn current(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified whenever a new snapshot is installed.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CatalogSnapshot>> {
        self.snapshot.subscribe()
    }

    pub fn status(&self) -> CatalogStatus {
        self.status.borrow().clone()
    }

    /// Fetches the catalog and installs it as the new snapshot.
    ///
    /// A call made while another load is running joins that load.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> CatalogStatus {
        let led = self
            .flight
            .run(|generation| async move {
                let _busy = BusyGuard::raise(&self.status, |s| &mut s.loading);
                let result = self.source.fetch_products().await;
                self.apply(generation, result);
            })
            .await;

        if led.is_none() {
            tracing::debug!("joined in-flight catalog load");
        }
        self.status()
    }

    fn apply(&self, generation: u64, result: Result<Vec<Product>, SourceError>) {
        match result {
            Ok(products) => {
                let now = Utc::now();
                let snapshot = Arc::new(CatalogSnapshot::new(generation, products, now));
                let (count, flagged) = (snapshot.len(), snapshot.flagged().count());

                let installed = self.snapshot.send_if_modified(|current| {
                    if generation <= current.version() {
                        return false;
                    }
                    *current = snapshot;
                    true
                });
                if !installed {
                    tracing::debug!(generation, "discarding catalog older than current snapshot");
                    return;
                }

                if flagged > 0 {
                    tracing::warn!(flagged, "catalog contains products with malformed fields");
                }
                tracing::info!(version = generation, products = count, "catalog snapshot installed");

                self.status.send_modify(|s| {
                    s.version = generation;
                    s.product_count = count;
                    s.flagged_count = flagged;
                    s.last_success = Some(now);
                    s.last_error = None;
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "catalog load failed; keeping previous snapshot");
                let failure = RefreshFailure::from(&err);
                self.status.send_modify(|s| s.last_error = Some(failure));
            }
        }
    }
}
