use axum::Router;
use domain_baskets::{
    BasketService, PgBasketRepository, PgSavedBasketRepository, SavedBasketService, handlers,
};

fn basket_repository(state: &crate::state::AppState) -> PgBasketRepository {
    PgBasketRepository::new(state.db.clone(), state.codec.clone())
}

pub fn baskets_router(state: &crate::state::AppState) -> Router {
    let service = BasketService::new(basket_repository(state), state.config.catalog.clone());
    handlers::baskets_router(service)
}

/// Saved baskets check ownership against the basket table
pub fn saved_baskets_router(state: &crate::state::AppState) -> Router {
    let repository = PgSavedBasketRepository::new(state.db.clone(), state.codec.clone());
    let service = SavedBasketService::new(
        repository,
        basket_repository(state),
        state.config.catalog.clone(),
    );
    handlers::saved_baskets_router(service)
}
