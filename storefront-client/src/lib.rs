//! # Storefront Client
//!
//! reqwest adapter implementing the storefront ports against the external
//! catalog, exchange-rate and contact services.
//!
//! Every call is attempted once. Network failures map to
//! [`SourceError::Transport`], non-success statuses to [`SourceError::Api`]
//! and bodies that do not parse to [`SourceError::Decode`].

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use storefront_types::{
    CatalogSource, ContactGateway, ContactRequest, ExchangeRateSource, ExchangeRatesResponse,
    NewProductRequest, Product, ProductId, ProductRecord, RateQuote, SourceError, decode_products,
};


/// Upper bound for a single request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for client construction.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client for the three external storefront services.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    catalog_url: String,
    rates_url: String,
    contact_url: String,
    http: Client,
}

impl StorefrontClient {
    /// Creates a client with the default request timeout.
    ///
    /// The contact endpoint is assumed to live next to the catalog.
    pub fn new(
        catalog_url: impl Into<String>,
        rates_url: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_http_client(catalog_url, rates_url, http))
    }

    pub fn with_http_client(
        catalog_url: impl Into<String>,
        rates_url: impl Into<String>,
        http: Client,
    ) -> Self {
        let catalog_url = trim_base(catalog_url.into());
        Self {
            contact_url: catalog_url.clone(),
            catalog_url,
            rates_url: trim_base(rates_url.into()),
            http,
        }
    }

    /// Sends contact messages to a different base URL.
    pub fn with_contact_url(mut self, contact_url: impl Into<String>) -> Self {
        self.contact_url = trim_base(contact_url.into());
        self
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    pub fn rates_url(&self) -> &str {
        &self.rates_url
    }

    pub fn contact_url(&self) -> &str {
        &self.contact_url
    }

    /// `{catalog}/products/{id}` with the id escaped as a single path segment.
    fn product_url(&self, id: &ProductId) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.catalog_url)
            .map_err(|e| SourceError::Transport(format!("invalid catalog URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport("catalog URL cannot have a path".into()))?
            .pop_if_empty()
            .push("products")
            .push(id.as_str());
        Ok(url)
    }

    async fn get_text(&self, url: String) -> Result<String, SourceError> {
        let resp = self.http.get(url).send().await.map_err(transport)?;
        self.handle_response(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, SourceError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(decode)
    }

    async fn post<B: serde::Serialize>(&self, url: String, body: &B) -> Result<String, SourceError> {
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        self.handle_response(resp).await
    }

    /// Returns the body of a successful response, or the API error.
    async fn handle_response(&self, resp: Response) -> Result<String, SourceError> {
        let status = resp.status();
        if status.is_success() {
            resp.text().await.map_err(transport)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(SourceError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn transport(err: reqwest::Error) -> SourceError {
    if err.is_decode() {
        SourceError::Decode(err.to_string())
    } else {
        SourceError::Transport(err.to_string())
    }
}

fn decode(err: serde_json::Error) -> SourceError {
    SourceError::Decode(err.to_string())
}

#[async_trait::async_trait]
impl CatalogSource for StorefrontClient {
    #[tracing::instrument(skip(self), fields(base = %self.catalog_url))]
    async fn fetch_products(&self) -> Result<Vec<Product>, SourceError> {
        let body = self.get_text(format!("{}/products", self.catalog_url)).await?;
        let products = decode_products(&body)?;
        tracing::debug!(count = products.len(), "fetched products");
        Ok(products)
    }

    #[tracing::instrument(skip(self, req), fields(code = %req.code))]
    async fn create_product(&self, mut req: NewProductRequest) -> Result<Product, SourceError> {
        req.validate()?;
        req.updated_at.get_or_insert_with(Utc::now);

        let body = self
            .post(format!("{}/products", self.catalog_url), &req)
            .await?;
        let record: ProductRecord = serde_json::from_str(&body).map_err(decode)?;
        Ok(record.into())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), SourceError> {
        let resp = self
            .http
            .delete(self.product_url(id)?)
            .send()
            .await
            .map_err(transport)?;
        self.handle_response(resp).await.map(|_| ())
    }
}

#[async_trait::async_trait]
impl ExchangeRateSource for StorefrontClient {
    #[tracing::instrument(skip(self), fields(base = %self.rates_url))]
    async fn fetch_rate(&self) -> Result<RateQuote, SourceError> {
        let resp: ExchangeRatesResponse = self
            .get_json(format!("{}/exchange-rates", self.rates_url))
            .await?;
        RateQuote::try_from(resp)
    }
}

#[async_trait::async_trait]
impl ContactGateway for StorefrontClient {
    #[tracing::instrument(skip(self, req))]
    async fn submit_contact(&self, req: ContactRequest) -> Result<(), SourceError> {
        req.validate()?;
        self.post(format!("{}/contact", self.contact_url), &req)
            .await
            .map(|_| ())
    }
}
