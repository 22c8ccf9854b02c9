//! Handler tests for the Currencies domain
//!
//! The router runs against a seeded in-memory repository (GBP, EUR, USD).

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use core_config::catalog::CatalogConfig;
use core_model::HashIdCodec;
use domain_currencies::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn app() -> Router {
    let settings = CatalogConfig::default();
    let codec = HashIdCodec::new(&settings.hashids_salt, settings.hashids_min_length);
    let repository = InMemoryCurrencyRepository::seeded(codec).await.unwrap();
    handlers::router(CurrencyService::new(repository, settings))
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

async fn by_code(app: &Router, code: &str) -> Currency {
    let response = app
        .clone()
        .oneshot(request("GET", &format!("/code/{}", code), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_list_enabled_returns_the_seed_in_order() {
    let response = app()
        .await
        .oneshot(request("GET", "/?enabled=true", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let currencies: Vec<Value> = json_body(response.into_body()).await;
    let codes: Vec<&str> = currencies.iter().filter_map(|c| c["code"].as_str()).collect();
    assert_eq!(codes, vec!["GBP", "EUR", "USD"]);
    assert_eq!(currencies[0]["format"], "&#xa3;{price}");
    assert_eq!(currencies[1]["exchange_rate"], "8.7260");
    assert_eq!(currencies[2]["format"], "&euro;{price}");
}

#[tokio::test]
async fn test_create_validates_and_rejects_duplicates() {
    let app = app().await;

    let created = app
        .clone()
        .oneshot(request(
            "POST",
            "/",
            Some(json!({
                "code": "JPY",
                "name": "Japanese Yen",
                "exchange_rate": "0.0655",
                "format": "&yen;{price}"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let jpy: Currency = json_body(created.into_body()).await;
    assert!(jpy.enabled);
    assert_eq!(jpy.decimal_point, ".");
    assert_eq!(jpy.audit.created_by, Some(7));

    let missing_placeholder = app
        .clone()
        .oneshot(request(
            "POST",
            "/",
            Some(json!({ "code": "CHF", "name": "Franc", "exchange_rate": "1.1", "format": "CHF" })),
        ))
        .await
        .unwrap();
    assert_eq!(missing_placeholder.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let duplicate = app
        .oneshot(request(
            "POST",
            "/",
            Some(json!({ "code": "EUR", "name": "Euro", "exchange_rate": "1", "format": "{price}" })),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_set_default_switches_and_protects_the_default() {
    let app = app().await;
    let gbp = by_code(&app, "GBP").await;
    let eur = by_code(&app, "eur").await;
    assert!(gbp.default);

    let locked = app
        .clone()
        .oneshot(request("DELETE", &format!("/{}", gbp.id), None))
        .await
        .unwrap();
    assert_eq!(locked.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let switched = app
        .clone()
        .oneshot(request("POST", &format!("/{}/default", eur.id), None))
        .await
        .unwrap();
    assert_eq!(switched.status(), StatusCode::OK);

    assert!(!by_code(&app, "GBP").await.default);
    assert!(by_code(&app, "EUR").await.default);

    let deleted = app
        .clone()
        .oneshot(request("DELETE", &format!("/{}", gbp.id), None))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let trashed = app
        .oneshot(request("GET", &format!("/{}?trashed=only", gbp.id), None))
        .await
        .unwrap();
    assert_eq!(trashed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_merges_and_format_uses_new_separators() {
    let app = app().await;
    let eur = by_code(&app, "EUR").await;

    let updated = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/{}", eur.id),
            Some(json!({ "decimal_point": ",", "thousand_point": ".", "format": "{price} &euro;" })),
        ))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let updated: Currency = json_body(updated.into_body()).await;
    assert_eq!(updated.name, "Euro");
    assert_eq!(updated.audit.updated_by, Some(7));

    let formatted = app
        .oneshot(request("GET", &format!("/{}/format?amount=1234567.891", eur.id), None))
        .await
        .unwrap();
    assert_eq!(formatted.status(), StatusCode::OK);
    let price: FormattedPrice = json_body(formatted.into_body()).await;
    assert_eq!(price.formatted, "1.234.567,89 &euro;");
}

#[tokio::test]
async fn test_unknown_code_and_id_are_not_found() {
    let app = app().await;
    let by_code = app
        .clone()
        .oneshot(request("GET", "/code/XYZ", None))
        .await
        .unwrap();
    assert_eq!(by_code.status(), StatusCode::NOT_FOUND);

    let by_id = app
        .oneshot(request("GET", "/zzzzzzzzzz", None))
        .await
        .unwrap();
    assert_eq!(by_id.status(), StatusCode::NOT_FOUND);
}
