use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    Actor, AuditEvent, AuditOutcome, HashedIdPath, ValidatedJson,
    errors::responses::{
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
        ValidationErrorResponse,
    },
    extract_user_agent,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::BasketResult;
use crate::models::{CreateSavedBasket, SavedBasket, UpdateSavedBasket};
use crate::repository::{BasketRepository, SavedBasketRepository};
use crate::service::SavedBasketService;

pub const TAG: &str = "saved-baskets";

/// OpenAPI documentation for the Saved Baskets API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_saved_baskets,
        save_basket,
        get_saved_basket,
        update_saved_basket,
        delete_saved_basket,
    ),
    components(
        schemas(SavedBasket, CreateSavedBasket, UpdateSavedBasket),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Baskets kept under a name by their owner")
    )
)]
pub struct ApiDoc;

type Shared<S, R> = State<Arc<SavedBasketService<S, R>>>;

/// Create the saved basket router with all HTTP endpoints
pub fn router<S, R>(service: SavedBasketService<S, R>) -> Router
where
    S: SavedBasketRepository + 'static,
    R: BasketRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_saved_baskets).post(save_basket))
        .route(
            "/{id}",
            get(get_saved_basket)
                .put(update_saved_basket)
                .delete(delete_saved_basket),
        )
        .with_state(shared_service)
}

/// Saved baskets of the acting user
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "Saved baskets", body = Vec<SavedBasket>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_saved_baskets<S: SavedBasketRepository, R: BasketRepository>(
    State(service): Shared<S, R>,
    Actor(ctx): Actor,
) -> BasketResult<Json<Vec<SavedBasket>>> {
    let saved = service.list(&ctx).await?;
    Ok(Json(saved))
}

/// Save one of the acting user's baskets under a name
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateSavedBasket,
    responses(
        (status = 201, description = "Basket saved", body = SavedBasket),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn save_basket<S: SavedBasketRepository, R: BasketRepository>(
    State(service): Shared<S, R>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateSavedBasket>,
) -> BasketResult<impl IntoResponse> {
    let saved = service.save(&ctx, input).await?;

    AuditEvent::from_context(
        &ctx,
        "saved_basket.create",
        Some(format!("saved_basket:{}", saved.id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok((StatusCode::CREATED, Json(saved)))
}

/// Get a saved basket by hashed ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed saved basket ID")
    ),
    responses(
        (status = 200, description = "Saved basket found", body = SavedBasket),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_saved_basket<S: SavedBasketRepository, R: BasketRepository>(
    State(service): Shared<S, R>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
) -> BasketResult<Json<SavedBasket>> {
    let saved = service.get(&ctx, &id).await?;
    Ok(Json(saved))
}

/// Rename a saved basket
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed saved basket ID")
    ),
    request_body = UpdateSavedBasket,
    responses(
        (status = 200, description = "Saved basket updated", body = SavedBasket),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_saved_basket<S: SavedBasketRepository, R: BasketRepository>(
    State(service): Shared<S, R>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    ValidatedJson(input): ValidatedJson<UpdateSavedBasket>,
) -> BasketResult<Json<SavedBasket>> {
    let saved = service.update(&ctx, &id, input).await?;
    Ok(Json(saved))
}

/// Soft delete a saved basket
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed saved basket ID")
    ),
    responses(
        (status = 204, description = "Saved basket deleted"),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_saved_basket<S: SavedBasketRepository, R: BasketRepository>(
    State(service): Shared<S, R>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
) -> BasketResult<impl IntoResponse> {
    service.delete(&ctx, &id).await?;

    AuditEvent::from_context(
        &ctx,
        "saved_basket.delete",
        Some(format!("saved_basket:{}", id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok(StatusCode::NO_CONTENT)
}
