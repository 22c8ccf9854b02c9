use axum::Router;
use domain_currencies::{CurrencyService, PgCurrencyRepository, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgCurrencyRepository::new(state.db.clone(), state.codec.clone());
    let service = CurrencyService::new(repository, state.config.catalog.clone());
    handlers::router(service)
}
