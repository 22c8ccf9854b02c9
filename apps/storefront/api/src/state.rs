//! Shared application state.
//!
//! Built once at startup; domain routers take what they need from it and
//! carry their own state afterwards.

use core_model::HashIdCodec;
use domain_search::SearchAdapter;

#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: sea_orm::DatabaseConnection,
    /// Hashed id codec shared by every repository
    pub codec: HashIdCodec,
    pub search: SearchAdapter,
}

impl AppState {
    pub fn new(
        config: crate::config::Config,
        db: sea_orm::DatabaseConnection,
        search: SearchAdapter,
    ) -> Self {
        let codec = HashIdCodec::new(
            &config.catalog.hashids_salt,
            config.catalog.hashids_min_length,
        );
        Self {
            config,
            db,
            codec,
            search,
        }
    }
}
