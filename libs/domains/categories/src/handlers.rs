use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
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
use core_model::Paginated;
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CategoryResult;
use crate::models::{
    Category, CategoryListQuery, CategoryNode, CategoryView, ChannelQuery, ChildrenStrategy,
    CreateCategory, DeleteCategoryQuery, NestedCategory, ReorderCategories, ReorderStatus,
    TrashedQuery, UpdateCategory,
};
use crate::repository::CategoryRepository;
use crate::service::CategoryService;

pub const TAG: &str = "categories";

/// OpenAPI documentation for the Categories API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_categories,
        create_category,
        nested_categories,
        root_categories,
        child_categories,
        reorder_categories,
        get_category,
        update_category,
        delete_category,
        restore_category,
    ),
    components(
        schemas(
            Category,
            CategoryNode,
            NestedCategory,
            CreateCategory,
            UpdateCategory,
            ReorderCategories,
            ReorderStatus,
            ChildrenStrategy,
            CategoryView,
        ),
        responses(
            NotFoundResponse,
            ValidationErrorResponse,
            ConflictResponse,
            UnprocessableEntityResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Category tree management")
    )
)]
pub struct ApiDoc;

/// Create the category router with all HTTP endpoints
pub fn router<R: CategoryRepository + 'static>(service: CategoryService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/nested", get(nested_categories))
        .route("/parent", get(root_categories))
        .route("/parent/{id}", get(child_categories))
        .route("/reorder", post(reorder_categories))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/{id}/restore", post(restore_category))
        .with_state(shared_service)
}

/// List categories, paginated or as the nested tree of one channel
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(CategoryListQuery),
    responses(
        (status = 200, description = "A page of categories, or the tree when `view=tree`", body = Paginated<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    Query(query): Query<CategoryListQuery>,
) -> CategoryResult<Response> {
    match query.view {
        CategoryView::Tree => {
            let tree = service.get_category_tree(&ctx, query.channel.clone()).await?;
            Ok(Json(tree).into_response())
        }
        CategoryView::List => {
            let page = service.get_paginated(&ctx, &query).await?;
            Ok(Json(page).into_response())
        }
    }
}

/// Create a category as the last child of its parent
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> CategoryResult<impl IntoResponse> {
    let category = service.create(&ctx, input).await?;

    AuditEvent::from_context(
        &ctx,
        "category.create",
        Some(format!("category:{}", category.id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({
        "slug": category.slug,
        "channel": category.channel,
        "parent_id": category.parent_id,
        "position": category.position,
    }))
    .log();

    Ok((StatusCode::CREATED, Json(category)))
}

/// Depth-first list of a channel's tree with the depth of every entry
#[utoipa::path(
    get,
    path = "/nested",
    tag = TAG,
    params(ChannelQuery),
    responses(
        (status = 200, description = "Flattened tree", body = Vec<NestedCategory>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn nested_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    Query(query): Query<ChannelQuery>,
) -> CategoryResult<Json<Vec<NestedCategory>>> {
    let nested = service.get_nested_list(&ctx, query.channel).await?;
    Ok(Json(nested))
}

/// Root categories of a channel
#[utoipa::path(
    get,
    path = "/parent",
    tag = TAG,
    params(ChannelQuery),
    responses(
        (status = 200, description = "Roots ordered by position", body = Vec<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn root_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    Query(query): Query<ChannelQuery>,
) -> CategoryResult<Json<Vec<Category>>> {
    let roots = service.get_by_parent_id(&ctx, None, query.channel).await?;
    Ok(Json(roots))
}

/// Immediate children of a category
#[utoipa::path(
    get,
    path = "/parent/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed category ID")
    ),
    responses(
        (status = 200, description = "Children ordered by position", body = Vec<Category>),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn child_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
) -> CategoryResult<Json<Vec<Category>>> {
    let children = service.get_by_parent_id(&ctx, Some(&id), None).await?;
    Ok(Json(children))
}

/// Move categories under a parent in the given order
#[utoipa::path(
    post,
    path = "/reorder",
    tag = TAG,
    request_body = ReorderCategories,
    responses(
        (status = 200, description = "Sibling group rewritten", body = ReorderStatus),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn reorder_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    Json(input): Json<ReorderCategories>,
) -> CategoryResult<Json<ReorderStatus>> {
    let parent = input.parent_id.clone();
    let siblings = input.siblings.clone();
    let status = service.reorder(&ctx, input).await?;

    AuditEvent::from_context(
        &ctx,
        "category.reorder",
        parent.map(|id| format!("category:{}", id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({ "siblings": siblings }))
    .log();

    Ok(Json(status))
}

/// Get a category by hashed ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed category ID"),
        TrashedQuery
    ),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    Query(query): Query<TrashedQuery>,
) -> CategoryResult<Json<Category>> {
    let category = service.get_by_hashed_id(&ctx, &id, query.trashed).await?;
    Ok(Json(category))
}

/// Update the name or slug of a category
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed category ID")
    ),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    HashedIdPath(id): HashedIdPath,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> CategoryResult<Json<Category>> {
    let category = service.update(&ctx, &id, input).await?;
    Ok(Json(category))
}

/// Soft delete a category
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed category ID"),
        DeleteCategoryQuery
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
    Query(query): Query<DeleteCategoryQuery>,
) -> CategoryResult<impl IntoResponse> {
    let trashed = service.delete(&ctx, &id, query.children).await?;

    AuditEvent::from_context(
        &ctx,
        "category.delete",
        Some(format!("category:{}", id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({
        "children": query.children.to_string(),
        "trashed": trashed,
    }))
    .log();

    Ok(StatusCode::NO_CONTENT)
}

/// Bring a trashed category back as the last child of its parent
#[utoipa::path(
    post,
    path = "/{id}/restore",
    tag = TAG,
    params(
        ("id" = String, Path, description = "Hashed category ID")
    ),
    responses(
        (status = 200, description = "Category restored", body = Category),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn restore_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Actor(ctx): Actor,
    headers: HeaderMap,
    HashedIdPath(id): HashedIdPath,
) -> CategoryResult<Json<Category>> {
    let category = service.restore(&ctx, &id).await?;

    AuditEvent::from_context(
        &ctx,
        "category.restore",
        Some(format!("category:{}", category.id)),
        AuditOutcome::Success,
    )
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok(Json(category))
}
