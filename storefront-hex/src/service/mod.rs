//! Storefront Application Service
//!
//! Wires the catalog store, the exchange rate cache and the view controller
//! over a single backend that provides every outbound port.
//! Contains NO infrastructure logic - pure orchestration.

mod background;
mod catalog_store;
mod controller;
mod rate_cache;
mod single_flight;
mod status;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use exchange_rates::{Direction, ExchangeRate};
use storefront_types::query;
use storefront_types::{
    AppError, ContactRequest, DeleteAck, NewProductRequest, Product, ProductId, StorefrontBackend,
};

pub use background::RefreshTask;
pub use catalog_store::{CatalogStatus, CatalogStore};
pub use controller::{
    Calculator, CatalogController, CatalogView, ControllerSettings, ProductView, ReferencePrice,
    ViewRequest,
};
pub use rate_cache::{DEFAULT_REFRESH_PERIOD, ExchangeRateCache, Freshness, RateState};
pub use single_flight::SingleFlight;
pub use status::{FailureKind, RefreshFailure};

/// Combined health of both background data sources.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub catalog: CatalogStatus,
    pub exchange_rate: RateState,
}

/// Application service for the storefront.
///
/// Generic over `P: StorefrontBackend` - the adapter is injected at compile time.
/// The store and the rate cache are shared by every controller handed out.
pub struct StorefrontService<P: StorefrontBackend> {
    backend: Arc<P>,
    store: Arc<CatalogStore<Arc<P>>>,
    rates: Arc<ExchangeRateCache<Arc<P>>>,
    settings: ControllerSettings,
}

impl<P: StorefrontBackend> StorefrontService<P> {
    /// Creates a service with the 850 CLP/USD default and a 30 minute cadence.
    pub fn new(backend: P) -> Self {
        Self::with_options(
            backend,
            ExchangeRate::fallback(),
            DEFAULT_REFRESH_PERIOD,
            ControllerSettings::default(),
        )
    }

    pub fn with_options(
        backend: P,
        default_rate: ExchangeRate,
        refresh_period: Duration,
        settings: ControllerSettings,
    ) -> Self {
        let backend = Arc::new(backend);
        Self {
            store: Arc::new(CatalogStore::new(backend.clone())),
            rates: Arc::new(ExchangeRateCache::with_default(
                backend.clone(),
                default_rate,
                refresh_period,
            )),
            backend,
            settings,
        }
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &P {
        &self.backend
    }

    pub fn store(&self) -> &Arc<CatalogStore<Arc<P>>> {
        &self.store
    }

    pub fn rates(&self) -> &Arc<ExchangeRateCache<Arc<P>>> {
        &self.rates
    }

    /// A fresh controller over the shared store and rate cache.
    pub fn controller(&self) -> CatalogController<Arc<P>, Arc<P>> {
        CatalogController::new(self.store.clone(), self.rates.clone(), self.settings)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Catalog Queries
    // ─────────────────────────────────────────────────────────────────────────────

    /// Computes a one-off view for a stateless caller.
    pub fn catalog_view(&self, req: ViewRequest) -> Result<CatalogView, AppError> {
        let mut controller = self.controller();
        controller.apply(req).cloned()
    }

    /// Category facets of the current snapshot.
    pub fn facets(&self) -> Vec<String> {
        query::facets(self.store.current().products())
    }

    pub fn promotions(&self) -> Vec<ProductView> {
        self.controller().promotions()
    }

    /// Converts an amount at the current rate.
    pub fn convert(&self, amount: f64, direction: Direction) -> Result<ReferencePrice, AppError> {
        let calculator = Calculator { amount, direction };
        ReferencePrice::compute(&calculator, &self.rates.state()).map_err(Into::into)
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            catalog: self.store.status(),
            exchange_rate: self.rates.state(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Refresh
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn reload(&self) -> CatalogStatus {
        self.store.load().await
    }

    pub async fn refresh_rate(&self) -> RateState {
        self.rates.refresh().await
    }

    /// Starts the periodic rate refresh. Keep the task alive to keep it running.
    pub fn spawn_rate_refresh(&self) -> RefreshTask {
        self.rates.spawn_refresh()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Admin & Contact
    // ─────────────────────────────────────────────────────────────────────────────

    /// Validates and creates a product, then reloads the catalog.
    #[tracing::instrument(skip(self, req), fields(code = %req.code))]
    pub async fn create_product(&self, req: NewProductRequest) -> Result<Product, AppError> {
        req.validate()?;

        let product = self.backend.create_product(req).await?;
        tracing::info!(id = %product.id, "product created");
        self.store.load().await;
        Ok(product)
    }

    /// Deletes a product, then reloads the catalog.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<DeleteAck, AppError> {
        if id.as_str().trim().is_empty() {
            return Err(AppError::BadRequest("Product id cannot be empty".into()));
        }

        self.backend.delete_product(&id).await?;
        tracing::info!(%id, "product deleted");
        self.store.load().await;
        Ok(DeleteAck { id, deleted: true })
    }

    /// Validates and forwards a contact message.
    #[tracing::instrument(skip(self, req), fields(subject = %req.subject))]
    pub async fn submit_contact(&self, req: ContactRequest) -> Result<(), AppError> {
        req.validate()?;

        self.backend.submit_contact(req).await.map_err(Into::into)
    }
}
