//! Catalog service port.
//!
//! Implementations can be HTTP clients, in-memory fixtures, etc.

use std::sync::Arc;

use crate::domain::{Product, ProductId};
use crate::dto::NewProductRequest;
use crate::error::SourceError;

/// Port trait for the external product catalog.
///
/// Every call is attempted at most once; retries are the caller's decision.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    /// Fetches the full product collection.
    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError>;

    /// Creates a product and returns the stored record.
    async fn create_product(&self, req: NewProductRequest) -> Result<Product, SourceError>;

    /// Removes a product.
    async fn delete_product(&self, id: &ProductId) -> Result<(), SourceError>;
}

#[async_trait::async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError> {
        (**self).fetch_products().await
    }

    async fn create_product(&self, req: NewProductRequest) -> Result<Product, SourceError> {
        (**self).create_product(req).await
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), SourceError> {
        (**self).delete_product(id).await
    }
}
