//! Handler tests for the Baskets domain
//!
//! Both routers share one in-memory basket store, the way the API wires them.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use core_config::catalog::CatalogConfig;
use core_model::HashIdCodec;
use domain_baskets::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

struct Apps {
    baskets: Router,
    saved: Router,
}

fn apps() -> Apps {
    let settings = CatalogConfig::default();
    let codec = HashIdCodec::new(&settings.hashids_salt, settings.hashids_min_length);
    let baskets = InMemoryBasketRepository::new(codec.clone());

    Apps {
        saved: handlers::saved_baskets_router(SavedBasketService::new(
            InMemorySavedBasketRepository::new(codec),
            baskets.clone(),
            settings.clone(),
        )),
        baskets: handlers::baskets_router(BasketService::new(baskets, settings)),
    }
}

fn request(method: &str, uri: &str, user: Option<i64>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn create_basket(app: &Router, user: Option<i64>, lines: Value) -> Basket {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/",
            user,
            Some(json!({ "currency": "GBP", "lines": lines })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_guest_basket_lines() {
    let apps = apps();
    let basket = create_basket(
        &apps.baskets,
        None,
        json!([{ "variant": "mug", "quantity": 2, "unit_price": "4.50" }]),
    )
    .await;
    assert_eq!(basket.user_id, None);
    assert_eq!(basket.total.to_string(), "9.00");

    let added = apps
        .baskets
        .clone()
        .oneshot(request(
            "POST",
            &format!("/{}/lines", basket.id),
            None,
            Some(json!({ "variant": "cap", "quantity": 1, "unit_price": "15.00" })),
        ))
        .await
        .unwrap();
    assert_eq!(added.status(), StatusCode::OK);

    let removed = apps
        .baskets
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/{}/lines", basket.id),
            None,
            Some(json!({ "variant": "mug", "quantity": 0, "unit_price": "4.50" })),
        ))
        .await
        .unwrap();
    let removed: Basket = json_body(removed.into_body()).await;
    assert_eq!(removed.lines.len(), 1);
    assert_eq!(removed.lines[0].variant, "cap");
    assert_eq!(removed.total.to_string(), "15.00");

    let zero_add = apps
        .baskets
        .oneshot(request(
            "POST",
            &format!("/{}/lines", basket.id),
            None,
            Some(json!({ "variant": "cap", "quantity": 0, "unit_price": "15.00" })),
        ))
        .await
        .unwrap();
    assert_eq!(zero_add.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_owned_baskets_are_private() {
    let apps = apps();
    let basket = create_basket(&apps.baskets, Some(7), json!([])).await;

    for user in [Some(8), None] {
        let response = apps
            .baskets
            .clone()
            .oneshot(request("GET", &format!("/{}", basket.id), user, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let current = apps
        .baskets
        .clone()
        .oneshot(request("GET", "/current", Some(7), None))
        .await
        .unwrap();
    assert_eq!(current.status(), StatusCode::OK);
    let current: Basket = json_body(current.into_body()).await;
    assert_eq!(current.id, basket.id);

    let anonymous = apps
        .baskets
        .oneshot(request("GET", "/current", None, None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_merge_guest_into_user_basket() {
    let apps = apps();
    let user = create_basket(
        &apps.baskets,
        Some(7),
        json!([{ "variant": "mug", "quantity": 1, "unit_price": "4.50" }]),
    )
    .await;
    let guest = create_basket(
        &apps.baskets,
        None,
        json!([
            { "variant": "mug", "quantity": 2, "unit_price": "5.00" },
            { "variant": "cap", "quantity": 1, "unit_price": "15.00" }
        ]),
    )
    .await;

    let response = apps
        .baskets
        .clone()
        .oneshot(request(
            "POST",
            &format!("/{}/merge", user.id),
            Some(7),
            Some(json!({ "basket_id": guest.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let merged: Basket = json_body(response.into_body()).await;
    let lines: Vec<(&str, u32)> = merged
        .lines
        .iter()
        .map(|l| (l.variant.as_str(), l.quantity))
        .collect();
    assert_eq!(lines, vec![("mug", 3), ("cap", 1)]);
    assert_eq!(merged.total.to_string(), "28.50");

    let gone = apps
        .baskets
        .clone()
        .oneshot(request("GET", &format!("/{}", guest.id), None, None))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let again = apps
        .baskets
        .oneshot(request(
            "POST",
            &format!("/{}/merge", user.id),
            None,
            Some(json!({ "basket_id": guest.id })),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_merge_rejects_other_currency() {
    let apps = apps();
    let user = create_basket(&apps.baskets, Some(7), json!([])).await;
    let euro = apps
        .baskets
        .clone()
        .oneshot(request("POST", "/", None, Some(json!({ "currency": "EUR" }))))
        .await
        .unwrap();
    let euro: Basket = json_body(euro.into_body()).await;

    let response = apps
        .baskets
        .oneshot(request(
            "POST",
            &format!("/{}/merge", user.id),
            Some(7),
            Some(json!({ "basket_id": euro.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_saved_basket_lifecycle() {
    let apps = apps();
    let basket = create_basket(&apps.baskets, Some(7), json!([])).await;

    let created = apps
        .saved
        .clone()
        .oneshot(request(
            "POST",
            "/",
            Some(7),
            Some(json!({ "basket_id": basket.id, "name": "Weekly shop" })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let saved: SavedBasket = json_body(created.into_body()).await;
    assert_eq!(saved.basket_id, basket.id);
    assert_eq!(saved.audit.created_by, Some(7));

    let renamed = apps
        .saved
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/{}", saved.id),
            Some(7),
            Some(json!({ "name": "Monthly shop" })),
        ))
        .await
        .unwrap();
    let renamed: SavedBasket = json_body(renamed.into_body()).await;
    assert_eq!(renamed.name, "Monthly shop");

    let unchanged = apps
        .saved
        .clone()
        .oneshot(request("PUT", &format!("/{}", saved.id), Some(7), Some(json!({}))))
        .await
        .unwrap();
    let unchanged: SavedBasket = json_body(unchanged.into_body()).await;
    assert_eq!(unchanged.name, "Monthly shop");

    let stranger = apps
        .saved
        .clone()
        .oneshot(request("GET", &format!("/{}", saved.id), Some(8), None))
        .await
        .unwrap();
    assert_eq!(stranger.status(), StatusCode::NOT_FOUND);

    let list = apps
        .saved
        .clone()
        .oneshot(request("GET", "/", Some(7), None))
        .await
        .unwrap();
    let list: Vec<SavedBasket> = json_body(list.into_body()).await;
    assert_eq!(list.len(), 1);

    let deleted = apps
        .saved
        .clone()
        .oneshot(request("DELETE", &format!("/{}", saved.id), Some(7), None))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let list = apps
        .saved
        .oneshot(request("GET", "/", Some(7), None))
        .await
        .unwrap();
    let list: Vec<SavedBasket> = json_body(list.into_body()).await;
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_saving_requires_owner() {
    let apps = apps();
    let guest = create_basket(&apps.baskets, None, json!([])).await;
    let owned = create_basket(&apps.baskets, Some(7), json!([])).await;

    let anonymous = apps
        .saved
        .clone()
        .oneshot(request(
            "POST",
            "/",
            None,
            Some(json!({ "basket_id": owned.id, "name": "Mine" })),
        ))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let guest_basket = apps
        .saved
        .oneshot(request(
            "POST",
            "/",
            Some(7),
            Some(json!({ "basket_id": guest.id, "name": "Guest" })),
        ))
        .await
        .unwrap();
    assert_eq!(guest_basket.status(), StatusCode::NOT_FOUND);
}
