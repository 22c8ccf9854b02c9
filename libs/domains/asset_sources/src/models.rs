use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use core_model::{AuditFields, Auditable, Localize, Trashed, now_utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").unwrap());

/// Where uploaded assets of a kind are stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssetSource {
    #[serde(skip)]
    pub key: i64,
    /// Hashed id
    pub id: String,
    pub name: String,
    /// Unique lookup key, e.g. `products`
    pub handle: String,
    /// Storage disk name
    pub disk: String,
    /// Default source for its disk
    pub default: bool,
    pub bucket: Option<String>,
    pub path: Option<String>,
    #[serde(flatten)]
    pub audit: AuditFields,
    pub disabled_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl AssetSource {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled_at.is_none()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_utc();
    }

    pub fn apply_update(&mut self, update: UpdateAssetSource) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(handle) = update.handle {
            self.handle = handle;
        }
        if let Some(disk) = update.disk {
            self.disk = disk;
        }
        if let Some(default) = update.default {
            self.default = default;
        }
        if let Some(bucket) = update.bucket {
            self.bucket = Some(bucket);
        }
        if let Some(path) = update.path {
            self.path = Some(path);
        }
        self.touch();
    }
}

impl Auditable for AssetSource {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Localize for AssetSource {
    fn localize(mut self, tz: &Tz) -> Self {
        self.disabled_at = self.disabled_at.localize(tz);
        self.created_at = self.created_at.localize(tz);
        self.updated_at = self.updated_at.localize(tz);
        self.deleted_at = self.deleted_at.localize(tz);
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateAssetSource {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 190), regex(path = *HANDLE))]
    pub handle: String,
    #[validate(length(min = 1, max = 100))]
    pub disk: String,
    #[serde(default)]
    pub default: bool,
    #[validate(length(min = 1, max = 255))]
    pub bucket: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateAssetSource {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 190), regex(path = *HANDLE))]
    pub handle: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub disk: Option<String>,
    pub default: Option<bool>,
    #[validate(length(min = 1, max = 255))]
    pub bucket: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub path: Option<String>,
}

/// Query string of `GET /asset-sources`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
pub struct AssetSourceFilter {
    /// `true` for sources without `disabled_at`, `false` for disabled ones
    pub enabled: Option<bool>,
    pub disk: Option<String>,
    #[serde(default)]
    pub trashed: Trashed,
}

impl AssetSourceFilter {
    pub fn admits(&self, source: &AssetSource) -> bool {
        self.trashed.admits(source.deleted_at.as_ref())
            && self.enabled.is_none_or(|enabled| source.is_enabled() == enabled)
            && self.disk.as_ref().is_none_or(|disk| *disk == source.disk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(handle: &str) -> CreateAssetSource {
        CreateAssetSource {
            name: "Products".to_string(),
            handle: handle.to_string(),
            disk: "public".to_string(),
            default: false,
            bucket: None,
            path: Some("products".to_string()),
        }
    }

    #[test]
    fn handle_pattern() {
        assert!(input("products").validate().is_ok());
        assert!(input("channel_images").validate().is_ok());
        assert!(input("Product Images").validate().is_err());
        assert!(input("").validate().is_err());
    }

    #[test]
    fn filter_combines_enabled_disk_and_trashed() {
        let now = now_utc();
        let mut source = AssetSource {
            key: 1,
            id: "a".to_string(),
            name: "Products".to_string(),
            handle: "products".to_string(),
            disk: "public".to_string(),
            default: true,
            bucket: None,
            path: None,
            audit: AuditFields::default(),
            disabled_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let enabled_public = AssetSourceFilter {
            enabled: Some(true),
            disk: Some("public".to_string()),
            trashed: Trashed::Without,
        };
        assert!(enabled_public.admits(&source));

        source.disabled_at = Some(now);
        assert!(!enabled_public.admits(&source));
        assert!(AssetSourceFilter::default().admits(&source));

        source.deleted_at = Some(now);
        assert!(!AssetSourceFilter::default().admits(&source));
    }
}
