use axum::Router;
use domain_categories::{CategoryService, PgCategoryRepository, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgCategoryRepository::new(state.db.clone(), state.codec.clone());
    let service = CategoryService::new(repository, state.config.catalog.clone());
    handlers::router(service)
}
