//! Handler tests for the Search domain
//!
//! The router runs against the in-memory engine; the outage test points an
//! Elasticsearch engine at a closed port.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_search::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // For oneshot()

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri).header("x-user-id", "7");
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn catalog() -> Value {
    json!({
        "products": [
            { "id": "p1", "name": "Blue mug", "sku": "MUG-1", "categories": ["kitchen"], "price": "4.50" },
            { "id": "p2", "name": "Red cap", "description": "Matches the blue mug", "categories": ["apparel"] },
            { "id": "p3", "name": "Teapot", "categories": ["kitchen"], "price": "19.99" }
        ]
    })
}

async fn indexed_app() -> Router {
    let app = handlers::router(SearchAdapter::in_memory("test"));
    let response = app
        .clone()
        .oneshot(request("POST", "/products", Some(catalog())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary: Value = json_body(response.into_body()).await;
    assert_eq!(summary["indexed"], 3);
    app
}

#[tokio::test]
async fn test_keyword_search_ranks_name_matches_first() {
    let app = indexed_app().await;

    let response = app
        .oneshot(request("GET", "/?keywords=mug", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: Value = json_body(response.into_body()).await;
    assert_eq!(page["data"][0]["id"], "p1");
    assert_eq!(page["data"][0]["price"], "4.50");
    assert_eq!(page["data"][1]["id"], "p2");
    assert_eq!(page["meta"]["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_category_filter_and_paging() {
    let app = indexed_app().await;

    let response = app
        .oneshot(request("GET", "/?category=kitchen&per_page=1&page=2", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: Value = json_body(response.into_body()).await;
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["id"], "p3");
    assert_eq!(page["meta"]["pagination"]["total"], 2);
    assert_eq!(page["meta"]["pagination"]["total_pages"], 2);
    assert_eq!(page["meta"]["pagination"]["current_page"], 2);
}

#[tokio::test]
async fn test_reindex_replaces_the_catalog() {
    let app = indexed_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/products",
            Some(json!({ "products": [{ "id": "p9", "name": "Travel mug" }] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(request("GET", "/", None)).await.unwrap();
    let page: Value = json_body(response.into_body()).await;
    assert_eq!(page["meta"]["pagination"]["total"], 1);
    assert_eq!(page["data"][0]["id"], "p9");
}

#[tokio::test]
async fn test_remove_product() {
    let app = indexed_app().await;

    let response = app
        .clone()
        .oneshot(request("DELETE", "/products/p1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(request("DELETE", "/products/p1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(request("GET", "/?keywords=mug", None))
        .await
        .unwrap();
    let page: Value = json_body(response.into_body()).await;
    assert_eq!(page["meta"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_remove_rejects_path_traversal_ids() {
    let app = indexed_app().await;

    let response = app
        .clone()
        .oneshot(request("DELETE", "/products/..%2F..%2Fcustomers", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.oneshot(request("GET", "/", None)).await.unwrap();
    let page: Value = json_body(response.into_body()).await;
    assert_eq!(page["meta"]["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_product_ids_must_be_path_safe() {
    let app = handlers::router(SearchAdapter::in_memory("test"));

    let response = app
        .oneshot(request(
            "POST",
            "/products",
            Some(json!({ "products": [{ "id": "../customers", "name": "Mug" }] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_invalid_products_are_rejected() {
    let app = handlers::router(SearchAdapter::in_memory("test"));

    let response = app
        .oneshot(request(
            "POST",
            "/products",
            Some(json!({ "products": [{ "id": "p1", "name": "" }] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_engine_outage_is_service_unavailable() {
    let engine =
        Arc::new(ElasticSearchEngine::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap());
    let app = handlers::router(SearchAdapter::new(engine.clone(), engine, "test"));

    let response = app
        .oneshot(request("GET", "/?keywords=mug", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "SEARCH_UNAVAILABLE");
}
