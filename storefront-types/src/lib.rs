//! # Storefront Types
//!
//! Domain types, the catalog query engine and port traits for the storefront.
//! This crate has ZERO external IO dependencies - only data structures,
//! query logic, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Product, FilterCriteria, SortSpec, CatalogSnapshot)
//! - `query` - Filtering, sorting, facets and paging over a snapshot
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Wire formats of the external services
//! - `error/` - Domain, port and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;
pub mod query;

// Re-export commonly used types
pub use domain::{
    ALL_CATEGORIES, CatalogSnapshot, CategorySelector, DEFAULT_PAGE_SIZE, FieldDefect,
    FilterCriteria, PageRequest, PriceRange, Product, ProductField, ProductId, SortDirection,
    SortField, SortSpec, ViewMode,
};
pub use dto::*;
pub use error::{AppError, DomainError, SourceError};
pub use exchange_rates::{CurrencyCode, Direction, ExchangeRate};
pub use ports::{CatalogSource, ContactGateway, ExchangeRateSource, StorefrontBackend};
