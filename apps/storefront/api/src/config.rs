use core_config::{
    AppInfo, FromEnv, app_info, catalog::CatalogConfig, search::SearchConfig,
    server::ServerConfig,
};
use database::postgres::PostgresConfig;

pub use core_config::Environment;

/// Storefront API configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub catalog: CatalogConfig,
    pub search: SearchConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?; // Required - will fail if not set
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let catalog = CatalogConfig::from_env()?;
        let search = SearchConfig::from_env()?; // In-memory engine when SEARCH_URL is unset

        Ok(Self {
            app: app_info!(),
            database,
            server,
            environment,
            catalog,
            search,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn composes_catalog_and_search_settings() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/storefront")),
                ("CATEGORY_POSITION_BASE", Some("1")),
                ("SEARCH_URL", Some("http://search:9200")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "storefront_api");
                assert_eq!(config.catalog.category_position_base, 1);
                assert_eq!(config.search.url.as_deref(), Some("http://search:9200"));
            },
        );
    }
}
