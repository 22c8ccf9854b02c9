use axum_helpers::server::{
    CleanupCoordinator, close_postgres, create_production_app, health_router,
};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_search::SearchAdapter;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
        .await
        .map_err(|e| eyre::eyre!("Database migration failed: {}", e))?;

    let search = SearchAdapter::from_config(&config.search)
        .map_err(|e| eyre::eyre!("Search engine setup failed: {}", e))?;

    let state = AppState::new(config, db, search);

    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    // - /health: liveness check with app name/version
    // - /ready: readiness check against the database
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(
        app = state.config.app.name,
        version = state.config.app.version,
        "Starting storefront API"
    );

    let shutdown_timeout = state.config.server.shutdown_timeout();
    let server_config = state.config.server.clone();
    create_production_app(app, &server_config, shutdown_timeout, async move {
        let mut cleanup = CleanupCoordinator::new();
        cleanup.add_task("postgres", close_postgres(state.db, "storefront"));
        cleanup.run().await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Storefront API shutdown complete");
    Ok(())
}
