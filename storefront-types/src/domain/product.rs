//! Product domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique, stable identifier assigned by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Fields that may arrive malformed from the catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ProductField {
    Price,
    Stock,
    Rating,
    UpdatedAt,
}

/// A field value that could not be interpreted, kept verbatim for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldDefect {
    pub field: ProductField,
    /// The raw value as received
    pub raw: String,
}

/// An inventory item as held in a catalog snapshot.
///
/// Numeric fields are `None` when the upstream value was missing or
/// malformed. Malformed values are additionally listed in `defects`, so a
/// broken price is never mistaken for a price of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Brand / display name
    #[schema(example = "Taladro Percutor")]
    pub name: String,
    #[schema(example = "TP-750")]
    pub code: String,
    #[schema(example = "Herramientas")]
    pub category: String,
    /// Unit price in whole CLP
    #[schema(example = 89990)]
    pub price: Option<u64>,
    pub stock: Option<u64>,
    pub rating: Option<f64>,
    pub promotion: bool,
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defects: Vec<FieldDefect>,
}

impl Product {
    /// Creates a well-formed product with zero stock and no rating.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: u64,
    ) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            code: String::new(),
            category: category.into(),
            price: Some(price),
            stock: Some(0),
            rating: None,
            promotion: false,
            updated_at: None,
            defects: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_stock(mut self, stock: u64) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_promotion(mut self, promotion: bool) -> Self {
        self.promotion = promotion;
        self
    }

    /// Marks a field as malformed and clears its value.
    pub fn with_defect(mut self, field: ProductField, raw: impl Into<String>) -> Self {
        match field {
            ProductField::Price => self.price = None,
            ProductField::Stock => self.stock = None,
            ProductField::Rating => self.rating = None,
            ProductField::UpdatedAt => self.updated_at = None,
        }
        self.defects.push(FieldDefect {
            field,
            raw: raw.into(),
        });
        self
    }

    pub fn is_flagged(&self) -> bool {
        !self.defects.is_empty()
    }

    pub fn has_defect(&self, field: ProductField) -> bool {
        self.defects.iter().any(|d| d.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_creation() {
        let product = Product::new("1", "Sierra", "tools", 159_990).with_stock(4);
        assert_eq!(product.id.as_str(), "1");
        assert_eq!(product.price, Some(159_990));
        assert_eq!(product.stock, Some(4));
        assert!(!product.is_flagged());
    }

    #[test]
    fn test_defect_clears_value() {
        let product = Product::new("1", "Sierra", "tools", 159_990)
            .with_defect(ProductField::Price, "consultar");
        assert_eq!(product.price, None);
        assert!(product.is_flagged());
        assert!(product.has_defect(ProductField::Price));
        assert!(!product.has_defect(ProductField::Stock));
    }
}
