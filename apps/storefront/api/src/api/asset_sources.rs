use axum::Router;
use domain_asset_sources::{AssetSourceService, PgAssetSourceRepository, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgAssetSourceRepository::new(state.db.clone(), state.codec.clone());
    let service = AssetSourceService::new(repository, state.config.catalog.clone());
    handlers::router(service)
}
