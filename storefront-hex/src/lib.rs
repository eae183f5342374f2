//! # Storefront Hex
//!
//! Application service layer and HTTP adapter for the storefront.
//!
//! ## Architecture
//!
//! - `service/` - Catalog store, exchange rate cache and view controller
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `P: StorefrontBackend`, allowing different
//! catalog, rate and contact adapters to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;


pub use service::{CatalogController, CatalogView, ServiceStatus, StorefrontService};
