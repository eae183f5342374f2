//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use storefront_types::{
    AppError, ContactRequest, Direction, NewProductRequest, ProductId, StorefrontBackend,
};

use crate::StorefrontService;
use crate::openapi::ApiDoc;
use crate::service::ViewRequest;

/// Application state shared across handlers.
pub struct AppState<P: StorefrontBackend> {
    pub service: StorefrontService<P>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Query parameters of `GET /api/convert`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertParams {
    pub amount: f64,
    /// `usd-to-clp` (default) or `clp-to-usd`
    #[serde(default)]
    pub direction: Direction,
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Filtered, sorted and paginated listing.
#[tracing::instrument(skip(state))]
pub async fn catalog_view<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
    Query(req): Query<ViewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.service.catalog_view(req)?;
    Ok(Json(view))
}

pub async fn facets<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    Json(state.service.facets())
}

pub async fn promotions<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    Json(state.service.promotions())
}

/// Reload the catalog now. Failures are reported in the returned status.
#[tracing::instrument(skip(state))]
pub async fn reload_catalog<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    Json(state.service.reload().await)
}

pub async fn status<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    Json(state.service.status())
}

pub async fn exchange_rate<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    Json(state.service.rates().state())
}

/// Forced refresh outside the timer cadence.
#[tracing::instrument(skip(state))]
pub async fn refresh_exchange_rate<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    Json(state.service.refresh_rate().await)
}

#[tracing::instrument(skip(state), fields(amount = params.amount, direction = %params.direction))]
pub async fn convert<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
    Query(params): Query<ConvertParams>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = state.service.convert(params.amount, params.direction)?;
    Ok(Json(reference))
}

#[tracing::instrument(skip(state, req), fields(code = %req.code))]
pub async fn create_product<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<NewProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.service.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[tracing::instrument(skip(state), fields(product_id = %id))]
pub async fn delete_product<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ack = state.service.delete_product(ProductId::new(id)).await?;
    Ok(Json(ack))
}

#[tracing::instrument(skip(state, req))]
pub async fn submit_contact<P: StorefrontBackend>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.submit_contact(req).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "sent" })),
    ))
}

/// The OpenAPI document as JSON.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
