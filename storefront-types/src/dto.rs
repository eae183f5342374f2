//! Data Transfer Objects (DTOs) for the external services.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Product, ProductField, ProductId};
use crate::error::{DomainError, SourceError};

// ─────────────────────────────────────────────────────────────────────────────
// Catalog DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// A loosely typed JSON scalar as sent by the catalog service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn raw(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    fn as_whole(&self) -> Option<u64> {
        match self {
            Scalar::Int(n) => u64::try_from(*n).ok(),
            Scalar::Float(f) if f.is_finite() && *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_rating(&self) -> Option<f64> {
        let value = match self {
            Scalar::Int(n) => *n as f64,
            Scalar::Float(f) => *f,
            Scalar::Text(s) => s.trim().parse().ok()?,
            Scalar::Bool(_) => return None,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }

    fn as_flag(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Int(n) => *n == 1,
            Scalar::Text(s) => matches!(s.trim(), "1" | "true"),
            Scalar::Float(_) => false,
        }
    }
}

/// A product record on the wire.
///
/// Accepts canonical camelCase keys as well as the catalog's legacy upper-case
/// keys (`ID`, `MARCA`, `CODIGO`, `TIPO_PRODUCTO`, `PRECIO`, `STOCK`,
/// `FECHAUPDATE`, `PROMOCION`), where numbers usually arrive as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(alias = "ID")]
    pub id: Scalar,
    #[serde(default, alias = "MARCA", alias = "brand")]
    pub name: Option<String>,
    #[serde(default, alias = "CODIGO")]
    pub code: Option<String>,
    #[serde(default, alias = "TIPO_PRODUCTO", alias = "TIPO PRODUCTO")]
    pub category: Option<String>,
    #[serde(default, alias = "PRECIO")]
    pub price: Option<Scalar>,
    #[serde(default, alias = "STOCK")]
    pub stock: Option<Scalar>,
    #[serde(default, alias = "RATING")]
    pub rating: Option<Scalar>,
    #[serde(default, alias = "PROMOCION")]
    pub promotion: Option<Scalar>,
    #[serde(default, alias = "FECHAUPDATE", alias = "FECHA UPDATE")]
    pub updated_at: Option<String>,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let id = match &record.id {
            Scalar::Text(s) => s.clone(),
            other => other.raw(),
        };
        let mut product = Product::new(
            id,
            record.name.unwrap_or_default(),
            record.category.unwrap_or_default(),
            0,
        )
        .with_code(record.code.unwrap_or_default());
        product.price = None;
        product.stock = None;
        product.promotion = record.promotion.as_ref().is_some_and(Scalar::as_flag);

        product = match record.price {
            Some(price) => match price.as_whole() {
                Some(value) => Product { price: Some(value), ..product },
                None => product.with_defect(ProductField::Price, price.raw()),
            },
            // Absent or null: flagged like any other unusable price.
            None => product.with_defect(ProductField::Price, ""),
        };
        if let Some(stock) = record.stock {
            product = match stock.as_whole() {
                Some(value) => Product { stock: Some(value), ..product },
                None => product.with_defect(ProductField::Stock, stock.raw()),
            };
        }
        if let Some(rating) = record.rating {
            product = match rating.as_rating() {
                Some(value) => product.with_rating(value),
                None => product.with_defect(ProductField::Rating, rating.raw()),
            };
        }
        if let Some(raw) = record.updated_at.filter(|s| !s.trim().is_empty()) {
            product = match parse_timestamp(&raw) {
                Some(at) => Product { updated_at: Some(at), ..product },
                None => product.with_defect(ProductField::UpdatedAt, raw),
            };
        }
        product
    }
}

/// Parses RFC 3339, `YYYY-MM-DD HH:MM:SS` and plain `YYYY-MM-DD` timestamps as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(at.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

/// Decodes a `GET /products` body.
pub fn decode_products(body: &str) -> Result<Vec<Product>, SourceError> {
    let records: Vec<ProductRecord> =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
    Ok(records.into_iter().map(Product::from).collect())
}

/// Request to create a product through the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProductRequest {
    #[schema(example = "Taladro Percutor")]
    pub name: String,
    #[schema(example = "TP-750")]
    pub code: String,
    #[schema(example = "Herramientas")]
    pub category: String,
    /// Unit price in whole CLP
    #[schema(example = 89990)]
    pub price: i64,
    #[schema(example = 10)]
    pub stock: i64,
    #[serde(default)]
    pub promotion: bool,
    /// Assigned by the client when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewProductRequest {
    /// Checks the request before it is sent.
    pub fn validate(&self) -> Result<(), DomainError> {
        non_empty("name", &self.name)?;
        non_empty("code", &self.code)?;
        non_empty("category", &self.category)?;
        if self.price < 0 {
            return Err(DomainError::NegativeValue {
                field: "price",
                value: self.price,
            });
        }
        if self.stock < 0 {
            return Err(DomainError::NegativeValue {
                field: "stock",
                value: self.stock,
            });
        }
        Ok(())
    }
}

/// Acknowledgement returned after a product is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteAck {
    pub id: ProductId,
    pub deleted: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange Rate DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /exchange-rates` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRatesResponse {
    /// CLP per unit of each listed currency
    pub rates: HashMap<String, f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// A CLP-per-USD rate as published by the rate service, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    pub clp_per_usd: f64,
    pub published_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExchangeRatesResponse> for RateQuote {
    type Error = SourceError;

    fn try_from(resp: ExchangeRatesResponse) -> Result<Self, Self::Error> {
        let clp_per_usd = resp
            .rates
            .get("USD")
            .copied()
            .ok_or_else(|| SourceError::Decode("rates.USD missing from response".into()))?;
        Ok(Self {
            clp_per_usd,
            published_at: resp.last_updated.as_deref().and_then(parse_timestamp),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contact DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Message submitted through the contact form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactRequest {
    #[schema(example = "Ana")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    /// Optional
    #[serde(default)]
    pub phone: String,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        non_empty("name", &self.name)?;
        non_empty("email", &self.email)?;
        non_empty("subject", &self.subject)?;
        non_empty("message", &self.message)?;
        let email = self.email.trim();
        match email.split_once('@') {
            Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(DomainError::InvalidEmail(email.to_string())),
        }
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_legacy_record() {
        let body = r#"[{
            "ID": "7", "TIPO_PRODUCTO": "Herramientas", "MARCA": "Bosch", "CODIGO": "GSB-13",
            "PRECIO": "89990", "STOCK": "12", "FECHAUPDATE": "2024-03-01", "PROMOCION": true
        }]"#;
        let products = decode_products(body).unwrap();
        let p = &products[0];
        assert_eq!(p.id.as_str(), "7");
        assert_eq!(p.name, "Bosch");
        assert_eq!(p.code, "GSB-13");
        assert_eq!(p.category, "Herramientas");
        assert_eq!(p.price, Some(89_990));
        assert_eq!(p.stock, Some(12));
        assert!(p.promotion);
        assert_eq!(p.updated_at.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(!p.is_flagged());
    }

    #[test]
    fn test_decode_canonical_record() {
        let body = r#"[{"id": 3, "name": "Sierra", "code": "SC", "category": "tools",
            "price": 159990, "stock": 2, "rating": 4.5, "promotion": 0,
            "updatedAt": "2024-03-01T10:00:00Z"}]"#;
        let p = &decode_products(body).unwrap()[0];
        assert_eq!(p.id.as_str(), "3");
        assert_eq!(p.price, Some(159_990));
        assert_eq!(p.rating, Some(4.5));
        assert!(!p.promotion);
    }

    #[test]
    fn test_non_numeric_price_is_flagged_not_zero() {
        let body = r#"[{"ID": "1", "MARCA": "X", "PRECIO": "consultar", "STOCK": "-3"}]"#;
        let p = &decode_products(body).unwrap()[0];
        assert_eq!(p.price, None);
        assert_eq!(p.stock, None);
        assert!(p.has_defect(ProductField::Price));
        assert!(p.has_defect(ProductField::Stock));
        assert_eq!(p.defects[0].raw, "consultar");
    }

    #[test]
    fn test_missing_or_null_price_is_flagged() {
        let body = r#"[{"ID": "1", "MARCA": "X"}, {"id": "2", "name": "Y", "price": null}]"#;
        let products = decode_products(body).unwrap();
        for p in &products {
            assert_eq!(p.price, None);
            assert!(p.has_defect(ProductField::Price));
            assert!(p.is_flagged());
        }
        assert_eq!(products[0].defects[0].raw, "");
    }

    #[test]
    fn test_promotion_flag_variants() {
        let body = r#"[{"ID": 1, "PROMOCION": 1}, {"ID": 2, "PROMOCION": "0"}, {"ID": 3}]"#;
        let flags: Vec<bool> = decode_products(body).unwrap().iter().map(|p| p.promotion).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_malformed_body_is_decode_failure() {
        assert!(matches!(decode_products("{\"oops\": 1}"), Err(SourceError::Decode(_))));
        assert!(matches!(decode_products("[{\"MARCA\": \"no id\"}]"), Err(SourceError::Decode(_))));
    }

    #[test]
    fn test_rate_quote_from_response() {
        let resp: ExchangeRatesResponse = serde_json::from_str(
            r#"{"rates": {"USD": 943.27}, "lastUpdated": "2024-05-01T12:00:00.000Z"}"#,
        )
        .unwrap();
        let quote = RateQuote::try_from(resp).unwrap();
        assert_eq!(quote.clp_per_usd, 943.27);
        assert!(quote.published_at.is_some());
    }

    #[test]
    fn test_rate_quote_requires_usd() {
        let resp: ExchangeRatesResponse = serde_json::from_str(r#"{"rates": {"EUR": 1020.0}}"#).unwrap();
        assert!(matches!(RateQuote::try_from(resp), Err(SourceError::Decode(_))));
    }

    #[test]
    fn test_new_product_validation() {
        let mut req = NewProductRequest {
            name: "Sierra".into(),
            code: "SC".into(),
            category: "tools".into(),
            price: 159_990,
            stock: 1,
            promotion: false,
            updated_at: None,
        };
        assert!(req.validate().is_ok());
        req.price = -1;
        assert!(matches!(
            req.validate(),
            Err(DomainError::NegativeValue { field: "price", .. })
        ));
        req.price = 1;
        req.name = "  ".into();
        assert_eq!(req.validate(), Err(DomainError::EmptyField("name")));
    }

    #[test]
    fn test_contact_validation() {
        let mut req = ContactRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: String::new(),
            subject: "Cotización".into(),
            message: "Hola".into(),
        };
        assert!(req.validate().is_ok());
        req.email = "ana.example.com".into();
        assert!(matches!(req.validate(), Err(DomainError::InvalidEmail(_))));
        req.message = String::new();
        assert_eq!(req.validate(), Err(DomainError::EmptyField("message")));
    }
}
