use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Catalog categories, currencies, asset sources, baskets and product search"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "/categories", api = domain_categories::handlers::ApiDoc),
        (path = "/currencies", api = domain_currencies::handlers::ApiDoc),
        (path = "/asset-sources", api = domain_asset_sources::handlers::ApiDoc),
        (path = "/baskets", api = domain_baskets::handlers::baskets::ApiDoc),
        (path = "/saved-baskets", api = domain_baskets::handlers::saved_baskets::ApiDoc),
        (path = "/search", api = domain_search::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
