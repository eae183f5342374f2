//! OpenAPI document for the HTTP API.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use storefront_types::domain::{FieldDefect, Product, ProductField, ProductId, ViewMode};
use storefront_types::dto::{ContactRequest, DeleteAck, NewProductRequest};
use storefront_types::query::PageInfo;
use storefront_types::{Direction, ExchangeRate};
use utoipa::OpenApi;

use crate::inbound::handlers::ConvertParams;
use crate::service::{
    CatalogStatus, CatalogView, FailureKind, Freshness, ProductView, RateState, ReferencePrice,
    RefreshFailure, ServiceStatus, ViewRequest,
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Filtered, sorted and paginated catalog listing
#[utoipa::path(
    get,
    path = "/api/catalog",
    tag = "catalog",
    params(ViewRequest),
    responses(
        (status = 200, description = "Current page of the catalog", body = CatalogView),
        (status = 400, description = "Invalid price range, sort or amount")
    )
)]
async fn catalog_view() {}

/// Category facets of the current snapshot, `all` first
#[utoipa::path(
    get,
    path = "/api/facets",
    tag = "catalog",
    responses(
        (status = 200, description = "Facet values", body = Vec<String>, example = json!(["all", "Herramientas"]))
    )
)]
async fn facets() {}

/// Products on promotion
#[utoipa::path(
    get,
    path = "/api/promotions",
    tag = "catalog",
    responses(
        (status = 200, description = "Promoted products", body = Vec<ProductView>)
    )
)]
async fn promotions() {}

/// Reload the catalog from the catalog service
#[utoipa::path(
    post,
    path = "/api/catalog/reload",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog status after the load", body = CatalogStatus)
    )
)]
async fn reload_catalog() {}

/// Load status of the catalog and the exchange rate
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "health",
    responses(
        (status = 200, description = "Background refresh status", body = ServiceStatus)
    )
)]
async fn status() {}

/// Current CLP-per-USD rate
#[utoipa::path(
    get,
    path = "/api/exchange-rate",
    tag = "exchange-rate",
    responses(
        (status = 200, description = "Cached rate and freshness", body = RateState)
    )
)]
async fn exchange_rate() {}

/// Refresh the exchange rate now
#[utoipa::path(
    post,
    path = "/api/exchange-rate/refresh",
    tag = "exchange-rate",
    responses(
        (status = 200, description = "Rate state after the refresh", body = RateState)
    )
)]
async fn refresh_exchange_rate() {}

/// Convert an amount between USD and CLP
#[utoipa::path(
    get,
    path = "/api/convert",
    tag = "exchange-rate",
    params(ConvertParams),
    responses(
        (status = 200, description = "Converted and formatted amount", body = ReferencePrice),
        (status = 400, description = "Amount is not a finite number")
    )
)]
async fn convert() {}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = NewProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid product"),
        (status = 502, description = "Catalog service unavailable")
    )
)]
async fn create_product() {}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeleteAck),
        (status = 404, description = "Product not found"),
        (status = 502, description = "Catalog service unavailable")
    )
)]
async fn delete_product() {}

/// Send a contact message
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "contact",
    request_body = ContactRequest,
    responses(
        (status = 202, description = "Message accepted", body = inline(serde_json::Value), example = json!({"status": "sent"})),
        (status = 400, description = "Missing field or invalid email")
    )
)]
async fn submit_contact() {}

/// OpenAPI documentation for the Storefront API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Catalog API",
        version = "1.0.0",
        description = "Catalog listing with filtering, sorting and paging, plus USD/CLP price conversion.\n\nThe catalog and the exchange rate are cached and refreshed in the background; `/api/status` reports the last refresh outcome of each.",
        license(name = "MIT"),
    ),
    paths(
        health,
        catalog_view,
        facets,
        promotions,
        reload_catalog,
        status,
        exchange_rate,
        refresh_exchange_rate,
        convert,
        create_product,
        delete_product,
        submit_contact,
    ),
    components(
        schemas(
            Product,
            ProductId,
            ProductField,
            FieldDefect,
            ProductView,
            CatalogView,
            PageInfo,
            ViewMode,
            ReferencePrice,
            Direction,
            ExchangeRate,
            RateState,
            Freshness,
            CatalogStatus,
            RefreshFailure,
            FailureKind,
            ServiceStatus,
            NewProductRequest,
            DeleteAck,
            ContactRequest,
        )
    ),
    tags(
        (name = "health", description = "Health and refresh status"),
        (name = "catalog", description = "Catalog listing and facets"),
        (name = "exchange-rate", description = "Exchange rate and conversion"),
        (name = "products", description = "Product administration"),
        (name = "contact", description = "Contact form"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/catalog",
            "/api/facets",
            "/api/promotions",
            "/api/catalog/reload",
            "/api/status",
            "/api/exchange-rate",
            "/api/exchange-rate/refresh",
            "/api/convert",
            "/api/products",
            "/api/products/{id}",
            "/api/contact",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
