//! Domain models for the storefront catalog.

pub mod criteria;
pub mod product;
pub mod snapshot;

pub use criteria::{
    ALL_CATEGORIES, CategorySelector, DEFAULT_PAGE_SIZE, FilterCriteria, PageRequest, PriceRange,
    SortDirection, SortField, SortSpec, ViewMode,
};
pub use product::{FieldDefect, Product, ProductField, ProductId};
pub use snapshot::CatalogSnapshot;
