use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    Actor, AuditEvent, AuditOutcome, HashedIdPath, ValidatedJson,
    errors::responses::{
        ConflictResponse, InternalServerErrorResponse, NotFoundResponse,
        UnprocessableEntityResponse, ValidationErrorResponse,
    },
    extract_user_agent,
};
use core_model::Trashed;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};

use crate::error::CurrencyResult;
use crate::models::{
    CreateCurrency, Currency, CurrencyFilter, FormatQuery, FormattedPrice, UpdateCurrency,
};
use crate::repository::CurrencyRepository;
use crate::service::CurrencyService;

pub const TAG: &str = "currencies";

#[derive(Debug, Default, Deserialize, IntoParams)]
struct TrashedQuery {
    #[serde(default)]
    trashed: Trashed,
}

/// OpenAPI documentation for the Currencies API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_currencies,
        create_currency,
        get_currency_by_code,
        get_currency,
        update_currency,
        delete_currency,
        set_default_currency,
        format_price,
    ),
    components(
        schemas(Currency, CreateCurrency, UpdateCurrency, FormattedPrice),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            ConflictResponse,
            UnprocessableEntityResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Currencies and price display formats")
    )
)]
pub struct ApiDoc;

/// Create the currency router with all HTTP endpoints
pub fn router<R: CurrencyRepository + 'static>(service: CurrencyService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_currencies).post(create_currency))
        .route("/code/{code}", get(get_currency_by_code))
        .route(
            "/{id}",
            get(get_currency).put(update_currency).delete(delete_currency),
        )
        .route("/{id}/default", post(set_default_currency))
        .route("/{id}/format", get(format_price))
        .with_state(shared_service)
}

/// List currencies in insertion order
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(CurrencyFilter),
    responses(
        (status = 200, description = "List of currencies", body = Vec<Currency>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_currencies<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    Actor(ctx): Actor,
    Query(filter): Query<CurrencyFilter>,
) -> CurrencyResult<Json<Vec<Currency>>> {
    let currencies = service.list(&ctx, filter).await?;
    Ok(Json(currencies))
}

/// Create a currency
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateCurrency,
    responses(
        (status = 201, description = "Currency created", body = Currency),
        (status = 409, response = ConflictResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_currency<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateCurrency>,
) -> CurrencyResult<impl IntoResponse> {
    let currency = service.create(&ctx, input).await?;

    AuditEvent::from_context(
        &ctx,
        "currency.create",
        Some(format!("currency:{}", currency.id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({
        "code": currency.code,
        "exchange_rate": currency.exchange_rate.to_string(),
        "default": currency.default,
    }))
    .log();

    Ok((StatusCode::CREATED, Json(currency)))
}

/// Get a live currency by ISO code
#[utoipa::path(
    get,
    path = "/code/{code}",
    tag = TAG,
    params(
        ("code" = String, Path, description = "ISO-4217 code", example = "GBP")
    ),
    responses(
        (status = 200, description = "Currency found", body = Currency),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_currency_by_code<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    Actor(ctx): Actor,
    Path(code): Path<String>,
) -> CurrencyResult<Json<Currency>> {
    let currency = service.get_by_code(&ctx, &code).await?;
    Ok(Json(currency))
}

/// Get a currency by hashed ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed currency ID"),
        TrashedQuery
    ),
    responses(
        (status = 200, description = "Currency found", body = Currency),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_currency<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    Query(query): Query<TrashedQuery>,
) -> CurrencyResult<Json<Currency>> {
    let currency = service.get_by_hashed_id(&ctx, &id, query.trashed).await?;
    Ok(Json(currency))
}

/// Update a currency
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed currency ID")
    ),
    request_body = UpdateCurrency,
    responses(
        (status = 200, description = "Currency updated", body = Currency),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_currency<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    ValidatedJson(input): ValidatedJson<UpdateCurrency>,
) -> CurrencyResult<Json<Currency>> {
    let currency = service.update(&ctx, &id, input).await?;
    Ok(Json(currency))
}

/// Soft delete a currency
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed currency ID")
    ),
    responses(
        (status = 204, description = "Currency deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_currency<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
) -> CurrencyResult<impl IntoResponse> {
    service.delete(&ctx, &id).await?;

    AuditEvent::from_context(
        &ctx,
        "currency.delete",
        Some(format!("currency:{}", id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok(StatusCode::NO_CONTENT)
}

/// Make a currency the store default
#[utoipa::path(
    post,
    path = "/{id}/default",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed currency ID")
    ),
    responses(
        (status = 200, description = "Currency is now the default", body = Currency),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn set_default_currency<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
) -> CurrencyResult<Json<Currency>> {
    let currency = service.set_default(&ctx, &id).await?;

    AuditEvent::from_context(
        &ctx,
        "currency.set_default",
        Some(format!("currency:{}", currency.id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({ "code": currency.code }))
    .log();

    Ok(Json(currency))
}

/// Render an amount the way the storefront displays it
#[utoipa::path(
    get,
    path = "/{id}/format",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed currency ID"),
        FormatQuery
    ),
    responses(
        (status = 200, description = "Formatted price", body = FormattedPrice),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn format_price<R: CurrencyRepository>(
    State(service): State<Arc<CurrencyService<R>>>,
    HashedIdPath(id): HashedIdPath,
    Query(query): Query<FormatQuery>,
) -> CurrencyResult<Json<FormattedPrice>> {
    let price = service.format(&id, query.amount).await?;
    Ok(Json(price))
}
