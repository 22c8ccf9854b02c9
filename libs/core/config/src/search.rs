use crate::{env_optional, env_or_default, env_parse, ConfigError, FromEnv};

/// Search engine connection settings.
///
/// When `url` is `None` the application falls back to the in-process engine.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub url: Option<String>,
    pub index_prefix: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: None,
            index_prefix: "storefront".to_string(),
            timeout_secs: 5,
        }
    }
}

impl FromEnv for SearchConfig {
    /// Reads `SEARCH_URL` (optional), `SEARCH_INDEX_PREFIX` and `SEARCH_TIMEOUT_SECS`
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_optional("SEARCH_URL").map(|u| u.trim_end_matches('/').to_string()),
            index_prefix: env_or_default("SEARCH_INDEX_PREFIX", "storefront"),
            timeout_secs: env_parse("SEARCH_TIMEOUT_SECS", "5")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_without_url() {
        temp_env::with_vars_unset(["SEARCH_URL", "SEARCH_INDEX_PREFIX", "SEARCH_TIMEOUT_SECS"], || {
            let config = SearchConfig::from_env().unwrap();
            assert!(config.url.is_none());
            assert_eq!(config.index_prefix, "storefront");
            assert_eq!(config.timeout_secs, 5);
        });
    }

    #[test]
    fn test_search_config_trims_trailing_slash() {
        temp_env::with_var("SEARCH_URL", Some("http://localhost:9200/"), || {
            let config = SearchConfig::from_env().unwrap();
            assert_eq!(config.url.as_deref(), Some("http://localhost:9200"));
        });
    }

    #[test]
    fn test_search_config_invalid_timeout() {
        temp_env::with_var("SEARCH_TIMEOUT_SECS", Some("soon"), || {
            assert!(SearchConfig::from_env().is_err());
        });
    }
}
