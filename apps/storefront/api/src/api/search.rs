use axum::Router;
use domain_search::handlers;

pub fn router(state: &crate::state::AppState) -> Router {
    handlers::router(state.search.clone())
}
