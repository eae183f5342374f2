//! In-memory backend shared by the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};
use http_body_util::BodyExt;

use storefront_hex::StorefrontService;
use storefront_types::{
    CatalogSource, ContactGateway, ContactRequest, ExchangeRateSource, NewProductRequest, Product,
    ProductId, RateQuote, SourceError,
};

pub struct FixtureBackend {
    products: Mutex<Vec<Product>>,
    pub contacts: Mutex<Vec<ContactRequest>>,
    rate: f64,
    catalog_online: bool,
}

impl FixtureBackend {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            contacts: Mutex::new(Vec::new()),
            rate: 850.0,
            catalog_online: true,
        }
    }

    pub fn offline() -> Self {
        Self {
            catalog_online: false,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl CatalogSource for FixtureBackend {
    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError> {
        if !self.catalog_online {
            return Err(SourceError::Transport("connection refused".into()));
        }
        Ok(self.products.lock().unwrap().clone())
    }

    async fn create_product(&self, req: NewProductRequest) -> Result<Product, SourceError> {
        if !self.catalog_online {
            return Err(SourceError::Transport("connection refused".into()));
        }
        let mut products = self.products.lock().unwrap();
        let product = Product::new(
            (products.len() + 1).to_string(),
            req.name,
            req.category,
            req.price as u64,
        )
        .with_code(req.code)
        .with_stock(req.stock as u64);
        products.push(product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), SourceError> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| &p.id != id);
        if products.len() == before {
            return Err(SourceError::Api {
                status: 404,
                message: format!("Product {} not found", id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeRateSource for FixtureBackend {
    async fn fetch_rate(&self) -> Result<RateQuote, SourceError> {
        Ok(RateQuote {
            clp_per_usd: self.rate,
            published_at: None,
        })
    }
}

#[async_trait]
impl ContactGateway for FixtureBackend {
    async fn submit_contact(&self, req: ContactRequest) -> Result<(), SourceError> {
        self.contacts.lock().unwrap().push(req);
        Ok(())
    }
}

pub fn catalog() -> Vec<Product> {
    vec![
        Product::new("1", "Sierra Circular", "Herramientas", 159_990)
            .with_code("SC-200")
            .with_stock(5),
        Product::new("2", "Taladro Percutor", "Herramientas", 89_990)
            .with_code("TP-750")
            .with_stock(12)
            .with_promotion(true),
        Product::new("3", "Manguera 20m", "Jardín", 19_990)
            .with_code("MG-020")
            .with_stock(30),
    ]
}

/// A service whose catalog has already been loaded once.
pub async fn loaded_service(products: Vec<Product>) -> StorefrontService<FixtureBackend> {
    let service = StorefrontService::new(FixtureBackend::new(products));
    service.reload().await;
    service
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
