use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    Actor, AuditEvent, AuditOutcome, HashedIdPath, ValidatedJson,
    errors::responses::{
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
        UnprocessableEntityResponse, ValidationErrorResponse,
    },
    extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::BasketResult;
use crate::models::{AddLine, Basket, BasketLine, CreateBasket, MergeBaskets, SetLine};
use crate::repository::BasketRepository;
use crate::service::BasketService;

pub const TAG: &str = "baskets";

/// OpenAPI documentation for the Baskets API
#[derive(OpenApi)]
#[openapi(
    paths(
        create_basket,
        current_basket,
        get_basket,
        delete_basket,
        add_line,
        set_line,
        merge_basket,
    ),
    components(
        schemas(Basket, BasketLine, CreateBasket, AddLine, SetLine, MergeBaskets),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            UnauthorizedResponse,
            UnprocessableEntityResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Shopping baskets and guest basket merge")
    )
)]
pub struct ApiDoc;

/// Create the basket router with all HTTP endpoints
pub fn router<R: BasketRepository + 'static>(service: BasketService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", post(create_basket))
        .route("/current", get(current_basket))
        .route("/{id}", get(get_basket).delete(delete_basket))
        .route("/{id}/lines", post(add_line).put(set_line))
        .route("/{id}/merge", post(merge_basket))
        .with_state(shared_service)
}

/// Create a basket for the acting user, or a guest basket
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateBasket,
    responses(
        (status = 201, description = "Basket created", body = Basket),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_basket<R: BasketRepository>(
    State(service): State<Arc<BasketService<R>>>,
    Actor(ctx): Actor,
    ValidatedJson(input): ValidatedJson<CreateBasket>,
) -> BasketResult<impl IntoResponse> {
    let basket = service.create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(basket)))
}

/// Latest basket of the acting user
#[utoipa::path(
    get,
    path = "/current",
    tag = TAG,
    responses(
        (status = 200, description = "Current basket", body = Basket),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn current_basket<R: BasketRepository>(
    State(service): State<Arc<BasketService<R>>>,
    Actor(ctx): Actor,
) -> BasketResult<Json<Basket>> {
    let basket = service.current(&ctx).await?;
    Ok(Json(basket))
}

/// Get a basket by hashed ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed basket ID")
    ),
    responses(
        (status = 200, description = "Basket found", body = Basket),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_basket<R: BasketRepository>(
    State(service): State<Arc<BasketService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
) -> BasketResult<Json<Basket>> {
    let basket = service.get(&ctx, &id).await?;
    Ok(Json(basket))
}

/// Soft delete a basket
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed basket ID")
    ),
    responses(
        (status = 204, description = "Basket deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_basket<R: BasketRepository>(
    State(service): State<Arc<BasketService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
) -> BasketResult<impl IntoResponse> {
    service.delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a quantity of a variant
#[utoipa::path(
    post,
    path = "/{id}/lines",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed basket ID")
    ),
    request_body = AddLine,
    responses(
        (status = 200, description = "Basket with the line added", body = Basket),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_line<R: BasketRepository>(
    State(service): State<Arc<BasketService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    ValidatedJson(input): ValidatedJson<AddLine>,
) -> BasketResult<Json<Basket>> {
    let basket = service.add_line(&ctx, &id, input).await?;
    Ok(Json(basket))
}

/// Set the quantity of a variant; `0` removes the line
#[utoipa::path(
    put,
    path = "/{id}/lines",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed basket ID")
    ),
    request_body = SetLine,
    responses(
        (status = 200, description = "Basket with the line set", body = Basket),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn set_line<R: BasketRepository>(
    State(service): State<Arc<BasketService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    ValidatedJson(input): ValidatedJson<SetLine>,
) -> BasketResult<Json<Basket>> {
    let basket = service.set_line(&ctx, &id, input).await?;
    Ok(Json(basket))
}

/// Merge a guest basket into the acting user's basket
#[utoipa::path(
    post,
    path = "/{id}/merge",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed ID of the user's basket")
    ),
    request_body = MergeBaskets,
    responses(
        (status = 200, description = "Merged basket", body = Basket),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn merge_basket<R: BasketRepository>(
    State(service): State<Arc<BasketService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
    ValidatedJson(input): ValidatedJson<MergeBaskets>,
) -> BasketResult<Json<Basket>> {
    let guest = input.basket_id.clone();
    let basket = service.merge(&ctx, &id, input).await?;

    AuditEvent::from_context(
        &ctx,
        "basket.merge",
        Some(format!("basket:{}", basket.id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({ "merged": guest, "lines": basket.lines.len() }))
    .log();

    Ok(Json(basket))
}
