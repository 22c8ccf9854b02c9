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
use core_model::{RequestContext, Trashed};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};

use crate::error::AssetSourceResult;
use crate::models::{AssetSource, AssetSourceFilter, CreateAssetSource, UpdateAssetSource};
use crate::repository::AssetSourceRepository;
use crate::service::AssetSourceService;

pub const TAG: &str = "asset-sources";

#[derive(Debug, Default, Deserialize, IntoParams)]
struct TrashedQuery {
    #[serde(default)]
    trashed: Trashed,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
struct DeleteQuery {
    /// Remove the row permanently
    #[serde(default)]
    force: bool,
}

/// OpenAPI documentation for the Asset Sources API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_asset_sources,
        create_asset_source,
        get_asset_source_by_handle,
        get_asset_source,
        update_asset_source,
        delete_asset_source,
        enable_asset_source,
        disable_asset_source,
        restore_asset_source,
    ),
    components(
        schemas(AssetSource, CreateAssetSource, UpdateAssetSource),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            ConflictResponse,
            UnprocessableEntityResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Storage locations for uploaded assets")
    )
)]
pub struct ApiDoc;

/// Create the asset source router with all HTTP endpoints
pub fn router<R: AssetSourceRepository + 'static>(service: AssetSourceService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_asset_sources).post(create_asset_source))
        .route("/handle/{handle}", get(get_asset_source_by_handle))
        .route(
            "/{id}",
            get(get_asset_source)
                .put(update_asset_source)
                .delete(delete_asset_source),
        )
        .route("/{id}/enable", post(enable_asset_source))
        .route("/{id}/disable", post(disable_asset_source))
        .route("/{id}/restore", post(restore_asset_source))
        .with_state(shared_service)
}

fn audit(ctx: &RequestContext, headers: &HeaderMap, action: &str, id: &str) -> AuditEvent {
    AuditEvent::from_context(
        ctx,
        action,
        Some(format!("asset_source:{}", id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(headers))
}

/// List asset sources
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(AssetSourceFilter),
    responses(
        (status = 200, description = "List of asset sources", body = Vec<AssetSource>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_asset_sources<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    Query(filter): Query<AssetSourceFilter>,
) -> AssetSourceResult<Json<Vec<AssetSource>>> {
    let sources = service.list(&ctx, filter).await?;
    Ok(Json(sources))
}

/// Create an asset source
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateAssetSource,
    responses(
        (status = 201, description = "Asset source created", body = AssetSource),
        (status = 409, response = ConflictResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_asset_source<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateAssetSource>,
) -> AssetSourceResult<impl IntoResponse> {
    let source = service.create(&ctx, input).await?;

    audit(&ctx, &headers, "asset_source.create", &source.id)
        .with_details(json!({
            "handle": source.handle,
            "disk": source.disk,
            "default": source.default,
        }))
        .log();

    Ok((StatusCode::CREATED, Json(source)))
}

/// Get a live asset source by handle
#[utoipa::path(
    get,
    path = "/handle/{handle}",
    tag = TAG,
    params(
        ("handle" = String, Path, description = "Asset source handle", example = "products")
    ),
    responses(
        (status = 200, description = "Asset source found", body = AssetSource),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_asset_source_by_handle<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    Path(handle): Path<String>,
) -> AssetSourceResult<Json<AssetSource>> {
    let source = service.get_by_handle(&ctx, &handle).await?;
    Ok(Json(source))
}

/// Get an asset source by hashed ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed asset source ID"),
        TrashedQuery
    ),
    responses(
        (status = 200, description = "Asset source found", body = AssetSource),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_asset_source<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    Query(query): Query<TrashedQuery>,
) -> AssetSourceResult<Json<AssetSource>> {
    let source = service.get_by_hashed_id(&ctx, &id, query.trashed).await?;
    Ok(Json(source))
}

/// Update an asset source
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed asset source ID")
    ),
    request_body = UpdateAssetSource,
    responses(
        (status = 200, description = "Asset source updated", body = AssetSource),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_asset_source<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    ValidatedJson(input): ValidatedJson<UpdateAssetSource>,
) -> AssetSourceResult<Json<AssetSource>> {
    let source = service.update(&ctx, &id, input).await?;
    Ok(Json(source))
}

/// Delete an asset source; `force=true` removes it permanently
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed asset source ID"),
        DeleteQuery
    ),
    responses(
        (status = 204, description = "Asset source deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_asset_source<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
    Query(query): Query<DeleteQuery>,
) -> AssetSourceResult<impl IntoResponse> {
    service.delete(&ctx, &id, query.force).await?;

    let action = if query.force {
        "asset_source.force_delete"
    } else {
        "asset_source.delete"
    };
    audit(&ctx, &headers, action, &id).log();

    Ok(StatusCode::NO_CONTENT)
}

/// Clear `disabled_at`
#[utoipa::path(
    post,
    path = "/{id}/enable",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed asset source ID")
    ),
    responses(
        (status = 200, description = "Asset source enabled", body = AssetSource),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn enable_asset_source<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
) -> AssetSourceResult<Json<AssetSource>> {
    let source = service.enable(&ctx, &id).await?;
    audit(&ctx, &headers, "asset_source.enable", &source.id).log();
    Ok(Json(source))
}

/// Stamp `disabled_at`
#[utoipa::path(
    post,
    path = "/{id}/disable",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed asset source ID")
    ),
    responses(
        (status = 200, description = "Asset source disabled", body = AssetSource),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn disable_asset_source<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
) -> AssetSourceResult<Json<AssetSource>> {
    let source = service.disable(&ctx, &id).await?;
    audit(&ctx, &headers, "asset_source.disable", &source.id).log();
    Ok(Json(source))
}

/// Restore a soft-deleted asset source
#[utoipa::path(
    post,
    path = "/{id}/restore",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed asset source ID")
    ),
    responses(
        (status = 200, description = "Asset source restored", body = AssetSource),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn restore_asset_source<R: AssetSourceRepository>(
    State(service): State<Arc<AssetSourceService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
) -> AssetSourceResult<Json<AssetSource>> {
    let source = service.restore(&ctx, &id).await?;
    audit(&ctx, &headers, "asset_source.restore", &source.id).log();
    Ok(Json(source))
}
