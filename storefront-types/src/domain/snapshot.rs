//! Immutable catalog snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::product::Product;

/// The product collection held between reloads.
///
/// Snapshots are never mutated; a reload replaces the whole value. `version`
/// increases with every successful load and is 0 for the initial empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    version: u64,
    loaded_at: Option<DateTime<Utc>>,
    products: Vec<Product>,
}

impl CatalogSnapshot {
    /// The snapshot seen before the first successful load.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(version: u64, products: Vec<Product>, loaded_at: DateTime<Utc>) -> Self {
        Self {
            version,
            loaded_at: Some(loaded_at),
            products,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products carrying at least one malformed field.
    pub fn flagged(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_flagged())
    }
}
