use crate::{env_or_default, env_parse, ConfigError, FromEnv};
use chrono_tz::Tz;

/// Settings shared by the catalog domains: external id hashing, timezone
/// presentation, localisation and category ordering.
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// Salt keying the hashed id permutation. Changing it invalidates every
    /// id handed out to clients.
    pub hashids_salt: String,
    pub hashids_min_length: usize,
    /// Fallback timezone when a request does not name one
    pub app_timezone: Tz,
    /// Locale codes accepted as keys of localized fields
    pub supported_locales: Vec<String>,
    /// First sibling position, either 0 or 1
    pub category_position_base: i32,
    pub default_channel: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            hashids_salt: "storefront".to_string(),
            hashids_min_length: 8,
            app_timezone: Tz::UTC,
            supported_locales: vec!["en".to_string()],
            category_position_base: 0,
            default_channel: "webstore".to_string(),
        }
    }
}

impl FromEnv for CatalogConfig {
    /// Environment variables:
    /// - `HASHIDS_SALT` (default: "storefront")
    /// - `HASHIDS_MIN_LENGTH` (default: 8)
    /// - `APP_TIMEZONE` (default: "UTC")
    /// - `SUPPORTED_LOCALES` comma separated (default: "en")
    /// - `CATEGORY_POSITION_BASE` 0 or 1 (default: 0)
    /// - `DEFAULT_CHANNEL` (default: "webstore")
    fn from_env() -> Result<Self, ConfigError> {
        let app_timezone = env_or_default("APP_TIMEZONE", "UTC")
            .parse::<Tz>()
            .map_err(|e| ConfigError::ParseError {
                key: "APP_TIMEZONE".to_string(),
                details: e.to_string(),
            })?;

        let category_position_base: i32 = env_parse("CATEGORY_POSITION_BASE", "0")?;
        if !(0..=1).contains(&category_position_base) {
            return Err(ConfigError::ParseError {
                key: "CATEGORY_POSITION_BASE".to_string(),
                details: format!("expected 0 or 1, got {}", category_position_base),
            });
        }

        let supported_locales: Vec<String> = env_or_default("SUPPORTED_LOCALES", "en")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if supported_locales.is_empty() {
            return Err(ConfigError::ParseError {
                key: "SUPPORTED_LOCALES".to_string(),
                details: "at least one locale is required".to_string(),
            });
        }

        Ok(Self {
            hashids_salt: env_or_default("HASHIDS_SALT", "storefront"),
            hashids_min_length: env_parse("HASHIDS_MIN_LENGTH", "8")?,
            app_timezone,
            supported_locales,
            category_position_base,
            default_channel: env_or_default("DEFAULT_CHANNEL", "webstore"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 6] = [
        "HASHIDS_SALT",
        "HASHIDS_MIN_LENGTH",
        "APP_TIMEZONE",
        "SUPPORTED_LOCALES",
        "CATEGORY_POSITION_BASE",
        "DEFAULT_CHANNEL",
    ];

    #[test]
    fn test_catalog_config_defaults() {
        temp_env::with_vars_unset(VARS, || {
            let config = CatalogConfig::from_env().unwrap();
            assert_eq!(config.hashids_min_length, 8);
            assert_eq!(config.app_timezone, Tz::UTC);
            assert_eq!(config.supported_locales, vec!["en".to_string()]);
            assert_eq!(config.category_position_base, 0);
            assert_eq!(config.default_channel, "webstore");
        });
    }

    #[test]
    fn test_catalog_config_custom_values() {
        temp_env::with_vars(
            [
                ("APP_TIMEZONE", Some("Europe/London")),
                ("SUPPORTED_LOCALES", Some("en, FR ,de")),
                ("CATEGORY_POSITION_BASE", Some("1")),
            ],
            || {
                let config = CatalogConfig::from_env().unwrap();
                assert_eq!(config.app_timezone, chrono_tz::Europe::London);
                assert_eq!(config.supported_locales, vec!["en", "fr", "de"]);
                assert_eq!(config.category_position_base, 1);
            },
        );
    }

    #[test]
    fn test_catalog_config_rejects_unknown_timezone() {
        temp_env::with_var("APP_TIMEZONE", Some("Mars/Olympus"), || {
            let err = CatalogConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("APP_TIMEZONE"));
        });
    }

    #[test]
    fn test_catalog_config_rejects_position_base_out_of_range() {
        temp_env::with_var("CATEGORY_POSITION_BASE", Some("2"), || {
            let err = CatalogConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("CATEGORY_POSITION_BASE"));
        });
    }
}
