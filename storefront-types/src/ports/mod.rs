//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod catalog;
mod contact;
mod exchange;

pub use catalog::CatalogSource;
pub use contact::ContactGateway;
pub use exchange::ExchangeRateSource;

/// Everything the storefront needs from the outside world.
///
/// Implemented automatically for any type providing all three ports.
pub trait StorefrontBackend: CatalogSource + ExchangeRateSource + ContactGateway {}

impl<T: CatalogSource + ExchangeRateSource + ContactGateway> StorefrontBackend for T {}
