use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
};
use axum_helpers::{
    Actor, AuditEvent, AuditOutcome, ValidatedJson, ValidatedQuery,
    errors::responses::{
        InternalServerErrorResponse, NotFoundResponse, ServiceUnavailableResponse,
        ValidationErrorResponse,
    },
    extract_user_agent,
};
use core_model::{Paginated, RequestContext};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

use crate::adapter::SearchAdapter;
use crate::error::SearchResult;
use crate::models::{IndexSummary, ProductDocument, ProductHit, ProductQuery};

pub const TAG: &str = "search";

/// Products submitted for indexing
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct IndexProducts {
    #[validate(nested)]
    pub products: Vec<ProductDocument>,
}

/// OpenAPI documentation for the Search API
#[derive(OpenApi)]
#[openapi(
    paths(search_products, index_products, reindex_products, remove_product),
    components(
        schemas(ProductDocument, ProductHit, IndexProducts, IndexSummary),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Product search and indexing")
    )
)]
pub struct ApiDoc;

/// Create the search router with all HTTP endpoints
pub fn router(adapter: SearchAdapter) -> Router {
    let shared_adapter = Arc::new(adapter);

    Router::new()
        .route("/", get(search_products))
        .route("/products", post(index_products).put(reindex_products))
        .route("/products/{id}", delete(remove_product))
        .with_state(shared_adapter)
}

fn audit(ctx: &RequestContext, headers: &HeaderMap, action: &str, indexed: u64) -> AuditEvent {
    AuditEvent::from_context(
        ctx,
        action,
        Some("search:products".to_string()),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(headers))
    .with_details(json!({ "indexed": indexed }))
}

/// Search products by keywords, optionally within a category
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(ProductQuery),
    responses(
        (status = 200, description = "A page of ranked products", body = Paginated<ProductHit>),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn search_products(
    State(adapter): State<Arc<SearchAdapter>>,
    ValidatedQuery(query): ValidatedQuery<ProductQuery>,
) -> SearchResult<Json<Paginated<ProductHit>>> {
    let page = adapter.products().search(&query).await?;
    Ok(Json(page))
}

/// Add or replace products in the index
#[utoipa::path(
    post,
    path = "/products",
    tag = TAG,
    request_body = IndexProducts,
    responses(
        (status = 200, description = "Products indexed", body = IndexSummary),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn index_products(
    State(adapter): State<Arc<SearchAdapter>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<IndexProducts>,
) -> SearchResult<Json<IndexSummary>> {
    let indexed = adapter.products().index(&input.products).await?;
    audit(&ctx, &headers, "search.index", indexed).log();
    Ok(Json(IndexSummary { indexed }))
}

/// Rebuild the product index from scratch
#[utoipa::path(
    put,
    path = "/products",
    tag = TAG,
    request_body = IndexProducts,
    responses(
        (status = 200, description = "Index rebuilt", body = IndexSummary),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn reindex_products(
    State(adapter): State<Arc<SearchAdapter>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<IndexProducts>,
) -> SearchResult<Json<IndexSummary>> {
    let indexed = adapter.products().reindex(&input.products).await?;
    audit(&ctx, &headers, "search.reindex", indexed).log();
    Ok(Json(IndexSummary { indexed }))
}

/// Remove a product from the index
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Product document ID")
    ),
    responses(
        (status = 204, description = "Product removed"),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn remove_product(
    State(adapter): State<Arc<SearchAdapter>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> SearchResult<impl IntoResponse> {
    adapter.products().remove(&id).await?;

    AuditEvent::from_context(
        &ctx,
        "search.remove",
        Some(format!("product:{}", id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok(StatusCode::NO_CONTENT)
}
