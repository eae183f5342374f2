//! End-to-end tests of the HTTP routes against an in-memory backend.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use storefront_hex::{StorefrontService, inbound::HttpServer};
use tower::ServiceExt;

use common::{FixtureBackend, catalog, get, json_body, loaded_service, send_json};

async fn app() -> axum::Router {
    HttpServer::new(loaded_service(catalog()).await).router()
}

fn item_names(view: &serde_json::Value) -> Vec<String> {
    view["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_catalog_default_sort_is_by_name() {
    let response = app().await.oneshot(get("/api/catalog")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view = json_body(response).await;
    assert_eq!(
        item_names(&view),
        vec!["Manguera 20m", "Sierra Circular", "Taladro Percutor"]
    );
    assert_eq!(view["page"]["totalItems"], 3);
    assert_eq!(view["viewMode"], "grid");
    assert_eq!(view["snapshotVersion"], 1);
}

#[tokio::test]
async fn test_catalog_price_low_sort() {
    let response = app()
        .await
        .oneshot(get("/api/catalog?sort=price-low"))
        .await
        .unwrap();

    let view = json_body(response).await;
    assert_eq!(
        item_names(&view),
        vec!["Manguera 20m", "Taladro Percutor", "Sierra Circular"]
    );
}

#[tokio::test]
async fn test_catalog_direction_overrides_sort() {
    let response = app()
        .await
        .oneshot(get("/api/catalog?sort=stock&direction=desc"))
        .await
        .unwrap();

    let view = json_body(response).await;
    assert_eq!(
        item_names(&view),
        vec!["Manguera 20m", "Taladro Percutor", "Sierra Circular"]
    );
}

#[tokio::test]
async fn test_catalog_category_and_price_filter() {
    let response = app()
        .await
        .oneshot(get(
            "/api/catalog?category=Herramientas&min_price=0&max_price=100000",
        ))
        .await
        .unwrap();

    let view = json_body(response).await;
    assert_eq!(item_names(&view), vec!["Taladro Percutor"]);
    assert_eq!(view["items"][0]["priceDisplay"], "$89.990 CLP");
    assert_eq!(view["items"][0]["priceUsdDisplay"], "US$105.87");
}

#[tokio::test]
async fn test_catalog_search_matches_code() {
    let response = app()
        .await
        .oneshot(get("/api/catalog?search=sc-2"))
        .await
        .unwrap();

    let view = json_body(response).await;
    assert_eq!(item_names(&view), vec!["Sierra Circular"]);
}

#[tokio::test]
async fn test_catalog_inverted_price_range_is_bad_request() {
    let response = app()
        .await
        .oneshot(get("/api/catalog?min_price=10&max_price=5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], 400);
    assert!(json["error"].as_str().unwrap().contains("price range"));
}

#[tokio::test]
async fn test_catalog_unknown_sort_is_bad_request() {
    let response = app()
        .await
        .oneshot(get("/api/catalog?sort=colour"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_pagination() {
    let response = app()
        .await
        .oneshot(get("/api/catalog?page_size=2&page=2&view=list"))
        .await
        .unwrap();

    let view = json_body(response).await;
    assert_eq!(item_names(&view), vec!["Taladro Percutor"]);
    assert_eq!(view["page"]["page"], 2);
    assert_eq!(view["page"]["totalPages"], 2);
    assert_eq!(view["viewMode"], "list");
}

#[tokio::test]
async fn test_catalog_reference_price() {
    let response = app()
        .await
        .oneshot(get("/api/catalog?amount=50&convert=usd-to-clp"))
        .await
        .unwrap();

    let view = json_body(response).await;
    assert_eq!(view["reference"]["converted"], 42_500.0);
    assert_eq!(view["reference"]["formatted"], "$42.500 CLP");
    assert_eq!(view["reference"]["rateLine"], "1 USD = $850 CLP");
}

#[tokio::test]
async fn test_facets_and_promotions() {
    let app = app().await;

    let facets = json_body(app.clone().oneshot(get("/api/facets")).await.unwrap()).await;
    assert_eq!(facets, json!(["all", "Herramientas", "Jardín"]));

    let promos = json_body(app.oneshot(get("/api/promotions")).await.unwrap()).await;
    assert_eq!(item_names(&json!({ "items": promos })), vec!["Taladro Percutor"]);
}

#[tokio::test]
async fn test_offline_catalog_serves_empty_view() {
    let service = StorefrontService::new(FixtureBackend::offline());
    let app = HttpServer::new(service).router();

    let status = json_body(
        app.clone()
            .oneshot(send_json("POST", "/api/catalog/reload", json!({})))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["lastError"]["kind"], "transport");
    assert_eq!(status["loading"], false);

    let view = json_body(app.oneshot(get("/api/catalog")).await.unwrap()).await;
    assert_eq!(view["items"], json!([]));
    assert_eq!(view["facets"], json!(["all"]));
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange Rate
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_both_directions() {
    let app = app().await;

    let usd = json_body(
        app.clone()
            .oneshot(get("/api/convert?amount=100"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(usd["converted"], 85_000.0);
    assert_eq!(usd["formatted"], "$85.000 CLP");

    let clp = json_body(
        app.oneshot(get("/api/convert?amount=85000&direction=clp-to-usd"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(clp["converted"], 100.0);
    assert_eq!(clp["formatted"], "US$100");
}

#[tokio::test]
async fn test_convert_rejects_out_of_range_amount() {
    let response = app()
        .await
        .oneshot(get("/api/convert?amount=1e30"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("range"));
}

#[tokio::test]
async fn test_exchange_rate_refresh_marks_fresh() {
    let app = app().await;

    let state = json_body(app.clone().oneshot(get("/api/exchange-rate")).await.unwrap()).await;
    assert_eq!(state["freshness"], "uninitialized");

    let state = json_body(
        app.clone()
            .oneshot(send_json("POST", "/api/exchange-rate/refresh", json!({})))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(state["freshness"], "fresh");
    assert_eq!(state["rate"]["rate"], 850.0);

    let status = json_body(app.oneshot(get("/api/status")).await.unwrap()).await;
    assert_eq!(status["exchangeRate"]["freshness"], "fresh");
    assert_eq!(status["catalog"]["productCount"], 3);
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin & Contact
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_product_validates_and_reloads() {
    let app = app().await;
    let body = json!({
        "name": "Lijadora Orbital",
        "code": "LO-300",
        "category": "Herramientas",
        "price": -5,
        "stock": 4
    });

    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/products", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut valid = body;
    valid["price"] = json!(49_990);
    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/products", valid))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["code"], "LO-300");

    let view = json_body(app.oneshot(get("/api/catalog")).await.unwrap()).await;
    assert_eq!(view["page"]["totalItems"], 4);
}

#[tokio::test]
async fn test_delete_product() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(send_json("DELETE", "/api/products/99", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(send_json("DELETE", "/api/products/1", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["deleted"], true);

    let view = json_body(app.oneshot(get("/api/catalog")).await.unwrap()).await;
    assert_eq!(view["page"]["totalItems"], 2);
}

#[tokio::test]
async fn test_contact_submission() {
    let app = app().await;
    let message = json!({
        "name": "Ana",
        "email": "ana@example.com",
        "subject": "Cotización",
        "message": "¿Tienen despacho a regiones?"
    });

    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/contact", message.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let mut invalid = message;
    invalid["email"] = json!("ana.example.com");
    let response = app
        .oneshot(send_json("POST", "/api/contact", invalid))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app()
        .await
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let doc = json_body(response).await;
    assert!(doc["paths"]["/api/catalog"].is_object());
}
