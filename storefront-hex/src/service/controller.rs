//! Catalog Controller
//!
//! The only stateful piece of the presentation flow. Owns the user's filter,
//! sort and paging choices plus the calculator inputs, and turns the current
//! snapshot and exchange rate into a [`CatalogView`].
//!
//! Recomputation is driven by value equality on the declared inputs:
//! - the query runs again only when the snapshot version, the criteria or the
//!   sort change
//! - the view is rebuilt only when the query result, the exchange rate, the
//!   page, the view mode or the calculator change

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use exchange_rates::{ConversionError, CurrencyCode, Direction, ExchangeRate, format_amount};
use storefront_types::query::{self, PageInfo};
use storefront_types::{
    AppError, CatalogSource, CategorySelector, DEFAULT_PAGE_SIZE, ExchangeRateSource,
    FilterCriteria, PageRequest, PriceRange, Product, ProductId, SortDirection, SortSpec, ViewMode,
};

use super::background::RefreshTask;
use super::catalog_store::{CatalogStatus, CatalogStore};
use super::rate_cache::{ExchangeRateCache, Freshness, RateState};

/// Call-site configuration. Each surface picks its own layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub page_size: usize,
    pub view_mode: ViewMode,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            view_mode: ViewMode::Grid,
        }
    }
}

/// Inputs of the currency calculator widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calculator {
    pub amount: f64,
    pub direction: Direction,
}

impl Default for Calculator {
    fn default() -> Self {
        Self {
            amount: 100.0,
            direction: Direction::BaseToQuote,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View Model
// ─────────────────────────────────────────────────────────────────────────────

/// One listing row, with display prices in both currencies.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// `$159.990 CLP`; absent when the price is malformed
    pub price_display: Option<String>,
    pub price_usd: Option<f64>,
    /// `US$188.22`
    pub price_usd_display: Option<String>,
}

impl ProductView {
    pub fn new(product: Product, rate: &ExchangeRate) -> Self {
        let price_usd = product
            .price
            .and_then(|clp| rate.convert(clp as f64, Direction::QuoteToBase).ok());
        Self {
            price_display: product.price.map(|clp| format_amount(clp as f64, CurrencyCode::CLP)),
            price_usd,
            price_usd_display: price_usd.map(|usd| format_amount(usd, CurrencyCode::USD)),
            product,
        }
    }
}

/// The calculator result shown next to the listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePrice {
    pub amount: f64,
    pub direction: Direction,
    pub converted: f64,
    /// e.g. `US$100`
    pub formatted_input: String,
    /// e.g. `$85.000 CLP`
    pub formatted: String,
    /// e.g. `1 USD = $850 CLP`
    pub rate_line: String,
    pub rate: f64,
    pub freshness: Freshness,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl ReferencePrice {
    pub fn compute(calculator: &Calculator, state: &RateState) -> Result<Self, ConversionError> {
        let Calculator { amount, direction } = *calculator;
        let converted = state.rate.convert(amount, direction)?;
        Ok(Self {
            amount,
            direction,
            converted,
            formatted_input: format_amount(amount, direction.source()),
            formatted: format_amount(converted, direction.target()),
            rate_line: state.rate.describe(),
            rate: state.rate.rate(),
            freshness: state.freshness,
            updated_at: state.rate.updated_at(),
        })
    }
}

/// Everything presentation needs for one render.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub items: Vec<ProductView>,
    pub page: PageInfo,
    /// `"all"` followed by the snapshot's categories
    pub facets: Vec<String>,
    pub view_mode: ViewMode,
    /// Products with malformed fields anywhere in the snapshot
    #[schema(value_type = Vec<String>)]
    pub flagged: Vec<ProductId>,
    pub snapshot_version: u64,
    pub reference: Option<ReferencePrice>,
}

/// Listing options as they arrive from a query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewRequest {
    /// Case-insensitive match on name, code or category
    pub search: Option<String>,
    /// Exact category, or `all`
    pub category: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    /// `name`, `price`, `rating`, `stock`, `price-low`, `price-high`, `price:desc`
    pub sort: Option<String>,
    /// `asc` or `desc`; overrides the direction given in `sort`
    pub direction: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub view: Option<ViewMode>,
    /// Calculator amount
    pub amount: Option<f64>,
    /// Calculator direction, `usd-to-clp` or `clp-to-usd`
    pub convert: Option<Direction>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Memoization
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryKey {
    version: u64,
    criteria: FilterCriteria,
    sort: SortSpec,
}

struct QueryMemo {
    key: QueryKey,
    items: Vec<Product>,
    flagged: Vec<ProductId>,
    facets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewKey {
    query: QueryKey,
    rate: ExchangeRate,
    freshness: Freshness,
    page: PageRequest,
    view_mode: ViewMode,
    calculator: Calculator,
}

struct ViewMemo {
    key: ViewKey,
    view: CatalogView,
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

/// Owned session state over a shared store and rate cache.
///
/// Dropping the controller cancels the rate timer it started.
pub struct CatalogController<C: CatalogSource, R: ExchangeRateSource> {
    store: Arc<CatalogStore<C>>,
    rates: Arc<ExchangeRateCache<R>>,
    criteria: FilterCriteria,
    sort: SortSpec,
    page: usize,
    page_size: usize,
    view_mode: ViewMode,
    calculator: Calculator,
    query_memo: Option<QueryMemo>,
    view_memo: Option<ViewMemo>,
    query_runs: usize,
    view_builds: usize,
    refresh: Option<RefreshTask>,
}

impl<C: CatalogSource, R: ExchangeRateSource> CatalogController<C, R> {
    pub fn new(
        store: Arc<CatalogStore<C>>,
        rates: Arc<ExchangeRateCache<R>>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            store,
            rates,
            criteria: FilterCriteria::default(),
            sort: SortSpec::default(),
            page: 1,
            page_size: settings.page_size,
            view_mode: settings.view_mode,
            calculator: Calculator::default(),
            query_memo: None,
            view_memo: None,
            query_runs: 0,
            view_builds: 0,
            refresh: None,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn calculator(&self) -> Calculator {
        self.calculator
    }

    /// How many times the query engine has run for this controller.
    pub fn query_runs(&self) -> usize {
        self.query_runs
    }

    /// How many times the view model has been rebuilt.
    pub fn view_builds(&self) -> usize {
        self.view_builds
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Replaces the filter. A different filter goes back to page 1.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if self.criteria != criteria {
            self.criteria = criteria;
            self.page = 1;
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let criteria = self.criteria.clone().with_search(search);
        self.set_criteria(criteria);
    }

    pub fn set_category(&mut self, category: impl Into<CategorySelector>) {
        let criteria = self.criteria.clone().with_category(category);
        self.set_criteria(criteria);
    }

    pub fn set_price_range(&mut self, price: PriceRange) {
        let criteria = self.criteria.clone().with_price(price);
        self.set_criteria(criteria);
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        if self.sort != sort {
            self.sort = sort;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        if self.page_size != page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }

    pub fn set_calculator(&mut self, amount: f64, direction: Direction) -> Result<(), ConversionError> {
        exchange_rates::check_amount(amount)?;
        self.calculator = Calculator { amount, direction };
        Ok(())
    }

    /// Applies a query-string request on top of the current state.
    pub fn apply(&mut self, req: ViewRequest) -> Result<&CatalogView, AppError> {
        let mut criteria = self.criteria.clone();
        if let Some(search) = req.search {
            criteria = criteria.with_search(search);
        }
        if let Some(category) = req.category {
            criteria = criteria.with_category(category);
        }
        if req.min_price.is_some() || req.max_price.is_some() {
            criteria = criteria.with_price(PriceRange::from_bounds(req.min_price, req.max_price)?);
        }

        let mut sort = match req.sort.as_deref() {
            Some(raw) => raw.parse::<SortSpec>().map_err(AppError::BadRequest)?,
            None => self.sort,
        };
        if let Some(raw) = req.direction.as_deref() {
            sort.direction = raw.parse::<SortDirection>().map_err(AppError::BadRequest)?;
        }

        if req.amount.is_some() || req.convert.is_some() {
            let amount = req.amount.unwrap_or(self.calculator.amount);
            let direction = req.convert.unwrap_or(self.calculator.direction);
            self.set_calculator(amount, direction)?;
        }

        self.set_criteria(criteria);
        self.set_sort(sort);
        if let Some(page_size) = req.page_size {
            self.set_page_size(page_size);
        }
        if let Some(page) = req.page {
            self.set_page(page);
        }
        if let Some(view_mode) = req.view {
            self.set_view_mode(view_mode);
        }
        Ok(self.view())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outputs
    // ─────────────────────────────────────────────────────────────────────────

    /// The current view model, rebuilt only if one of its inputs changed.
    pub fn view(&mut self) -> &CatalogView {
        let snapshot = self.store.current();
        let query_key = QueryKey {
            version: snapshot.version(),
            criteria: self.criteria.clone(),
            sort: self.sort,
        };

        let memo = match self.query_memo.take() {
            Some(memo) if memo.key == query_key => memo,
            _ => {
                self.query_runs += 1;
                let result = query::query(snapshot.products(), &self.criteria, &self.sort);
                QueryMemo {
                    key: query_key.clone(),
                    items: result.items.into_iter().cloned().collect(),
                    flagged: result.flagged.into_iter().cloned().collect(),
                    facets: query::facets(snapshot.products()),
                }
            }
        };

        let rate = self.rates.state();
        let view_key = ViewKey {
            query: query_key,
            rate: rate.rate,
            freshness: rate.freshness,
            page: PageRequest::new(self.page, self.page_size),
            view_mode: self.view_mode,
            calculator: self.calculator,
        };

        let view = match self.view_memo.take() {
            Some(view) if view.key == view_key => view,
            _ => {
                self.view_builds += 1;
                ViewMemo {
                    view: build_view(&memo, &rate, &view_key),
                    key: view_key,
                }
            }
        };

        self.query_memo = Some(memo);
        &self.view_memo.insert(view).view
    }

    pub fn facets(&mut self) -> Vec<String> {
        self.view().facets.clone()
    }

    /// Promoted products of the current snapshot, ignoring the filter.
    pub fn promotions(&self) -> Vec<ProductView> {
        let snapshot = self.store.current();
        let rate = self.rates.rate();
        query::promotions(snapshot.products())
            .into_iter()
            .map(|p| ProductView::new(p.clone(), &rate))
            .collect()
    }

    pub fn status(&self) -> CatalogStatus {
        self.store.status()
    }

    pub fn rate_state(&self) -> RateState {
        self.rates.state()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Refresh
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn reload(&self) -> CatalogStatus {
        self.store.load().await
    }

    /// Forced rate refresh outside the timer cadence.
    pub async fn refresh_rate(&self) -> RateState {
        self.rates.refresh().await
    }

    /// Starts the periodic rate refresh if it is not already running.
    pub fn start(&mut self) {
        if self.refresh.is_none() {
            self.refresh = Some(self.rates.spawn_refresh());
        }
    }

    pub fn is_running(&self) -> bool {
        self.refresh.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancels the periodic rate refresh.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.refresh.take() {
            task.cancel();
        }
    }
}

fn build_view(memo: &QueryMemo, rate: &RateState, key: &ViewKey) -> CatalogView {
    let page = query::paginate(memo.items.iter().collect::<Vec<_>>(), key.page);
    let items = page
        .items
        .into_iter()
        .map(|p| ProductView::new(p.clone(), &rate.rate))
        .collect();
    let reference = match ReferencePrice::compute(&key.calculator, rate) {
        Ok(reference) => Some(reference),
        Err(err) => {
            tracing::warn!(error = %err, "reference price unavailable");
            None
        }
    };

    CatalogView {
        items,
        page: page.info,
        facets: memo.facets.clone(),
        view_mode: key.view_mode,
        flagged: memo.flagged.clone(),
        snapshot_version: key.query.version,
        reference,
    }
}
