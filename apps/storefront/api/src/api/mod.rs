use axum::Router;

pub mod asset_sources;
pub mod baskets;
pub mod categories;
pub mod currencies;
pub mod health;
pub mod search;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
///
/// Returns a stateless Router; every sub-router has its state applied.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new()
        .nest("/categories", categories::router(state))
        .nest("/currencies", currencies::router(state))
        .nest("/asset-sources", asset_sources::router(state))
        .nest("/baskets", baskets::baskets_router(state))
        .nest("/saved-baskets", baskets::saved_baskets_router(state))
        .nest("/search", search::router(state))
}

/// Creates a router with the /ready endpoint that performs actual health checks.
///
/// This router has state applied and can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
