//! Query inputs: filter criteria, sort order and paging.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DomainError;

/// Sentinel category value that selects every record.
pub const ALL_CATEGORIES: &str = "all";

/// Either every category or one exact category value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategorySelector {
    #[default]
    All,
    Exact(String),
}

impl CategorySelector {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategorySelector::All => true,
            CategorySelector::Exact(wanted) => wanted == category,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategorySelector::All => ALL_CATEGORIES,
            CategorySelector::Exact(category) => category,
        }
    }
}

impl From<String> for CategorySelector {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ALL_CATEGORIES {
            CategorySelector::All
        } else {
            CategorySelector::Exact(value)
        }
    }
}

impl From<&str> for CategorySelector {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<CategorySelector> for String {
    fn from(value: CategorySelector) -> Self {
        value.as_str().to_string()
    }
}

/// Inclusive price bounds in whole CLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct PriceRange {
    min: u64,
    max: u64,
}

impl PriceRange {
    /// The full range. Records with a malformed price are only admitted here.
    pub const ANY: PriceRange = PriceRange {
        min: 0,
        max: u64::MAX,
    };

    pub fn new(min: u64, max: u64) -> Result<Self, DomainError> {
        if min > max {
            return Err(DomainError::InvalidPriceRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Builds a range from optional bounds, open ends defaulting to the extremes.
    pub fn from_bounds(min: Option<u64>, max: Option<u64>) -> Result<Self, DomainError> {
        Self::new(min.unwrap_or(0), max.unwrap_or(u64::MAX))
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn contains(&self, price: u64) -> bool {
        self.min <= price && price <= self.max
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::ANY
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::ANY
    }
}

impl<'de> Deserialize<'de> for PriceRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            min: u64,
            max: u64,
        }
        let raw = Raw::deserialize(deserializer)?;
        PriceRange::new(raw.min, raw.max).map_err(serde::de::Error::custom)
    }
}

/// User-supplied filter for the catalog listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search: String,
    pub category: CategorySelector,
    pub price: PriceRange,
}

impl FilterCriteria {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<CategorySelector>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_price(mut self, price: PriceRange) -> Self {
        self.price = price;
        self
    }
}

/// Key used to order the listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Price,
    Rating,
    Stock,
}

impl FromStr for SortField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            "rating" => Ok(SortField::Rating),
            "stock" => Ok(SortField::Stock),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::Rating => "rating",
            SortField::Stock => "stock",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn asc(field: SortField) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: SortField) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// Accepts `price`, `price-desc`, `stock:asc` and the storefront's
/// `price-low` / `price-high` selector values.
impl FromStr for SortSpec {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "price-low" => return Ok(SortSpec::asc(SortField::Price)),
            "price-high" => return Ok(SortSpec::desc(SortField::Price)),
            _ => {}
        }
        match s.split_once([':', '-']) {
            Some((field, direction)) => Ok(SortSpec::new(field.parse()?, direction.parse()?)),
            None => Ok(SortSpec::asc(s.parse()?)),
        }
    }
}

/// Presentation layout carried through to the view model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl FromStr for ViewMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            _ => Err(format!("Unknown view mode: {}", s)),
        }
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}
