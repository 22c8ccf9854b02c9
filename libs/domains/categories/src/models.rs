use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use core_model::{AuditFields, Auditable, Localize, PageRequest, Trashed, now_utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Lowercase words joined by single dashes
static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

fn validate_name(name: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if name.values().any(|text| text.trim().is_empty()) {
        return Err(ValidationError::new("blank_translation"));
    }
    Ok(())
}

/// Category as presented to clients.
///
/// `key` and `parent_key` are the internal numeric ids; only the hashed
/// forms are serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    #[serde(skip)]
    pub key: i64,
    /// Hashed id
    pub id: String,
    /// Display name per locale
    pub name: BTreeMap<String, String>,
    pub slug: String,
    #[serde(skip)]
    pub parent_key: Option<i64>,
    /// Hashed id of the parent, absent for roots
    pub parent_id: Option<String>,
    /// Zero or one based index within the sibling group
    pub position: i32,
    /// Storefront handle the tree belongs to
    pub channel: String,
    #[serde(flatten)]
    pub audit: AuditFields,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl Category {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_utc();
    }

    pub fn apply_update(&mut self, update: UpdateCategory) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
        self.touch();
    }
}

impl Auditable for Category {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Localize for Category {
    fn localize(mut self, tz: &Tz) -> Self {
        self.created_at = self.created_at.localize(tz);
        self.updated_at = self.updated_at.localize(tz);
        self.deleted_at = self.deleted_at.localize(tz);
        self
    }
}

/// Category with its live children inlined, siblings ordered by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[schema(no_recursion)]
    pub children: Vec<CategoryNode>,
}

impl Localize for CategoryNode {
    fn localize(self, tz: &Tz) -> Self {
        Self {
            category: self.category.localize(tz),
            children: self.children.localize(tz),
        }
    }
}

/// Depth-first flattened tree entry; roots have depth 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedCategory {
    #[serde(flatten)]
    pub category: Category,
    pub depth: usize,
}

impl Localize for NestedCategory {
    fn localize(self, tz: &Tz) -> Self {
        Self {
            category: self.category.localize(tz),
            depth: self.depth,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1), custom(function = "validate_name"))]
    pub name: BTreeMap<String, String>,
    #[validate(length(min = 1, max = 190), regex(path = *SLUG))]
    pub slug: String,
    /// Hashed id of the parent; omitted for a root
    pub parent_id: Option<String>,
    /// Defaults to the parent's channel, else the configured default
    #[validate(length(min = 1, max = 100))]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1), custom(function = "validate_name"))]
    pub name: Option<BTreeMap<String, String>>,
    #[validate(length(min = 1, max = 190), regex(path = *SLUG))]
    pub slug: Option<String>,
}

/// New ordering for one sibling group.
///
/// `siblings` become the first children of `parent_id` (roots when absent)
/// in the listed order; children not listed keep their relative order after them.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ReorderCategories {
    pub parent_id: Option<String>,
    #[serde(default)]
    pub siblings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReorderStatus {
    pub status: String,
}

/// Values resolved by the service before a category is inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: BTreeMap<String, String>,
    pub slug: String,
    pub parent: Option<i64>,
    pub channel: String,
}

/// What happens to the children of a deleted category
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChildrenStrategy {
    /// Refuse while live children exist
    #[default]
    Forbid,
    /// Trash the whole subtree
    Cascade,
    /// Move the children into the deleted category's slot
    Reparent,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeleteCategoryQuery {
    #[serde(default)]
    pub children: ChildrenStrategy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CategoryView {
    #[default]
    List,
    Tree,
}

/// Query string of `GET /categories`
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct CategoryListQuery {
    /// `tree` returns the nested tree of `channel` instead of a page
    #[serde(default)]
    pub view: CategoryView,
    pub channel: Option<String>,
    pub per_page: Option<u64>,
    pub current_page: Option<u64>,
    /// Comma separated hashed ids
    pub ids: Option<String>,
    #[serde(default)]
    pub trashed: Trashed,
}

impl CategoryListQuery {
    pub fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.per_page.unwrap_or(defaults.per_page),
            self.current_page.unwrap_or(defaults.current_page),
        )
    }

    pub fn id_tokens(&self) -> Vec<String> {
        self.ids
            .as_deref()
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ChannelQuery {
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct TrashedQuery {
    #[serde(default)]
    pub trashed: Trashed,
}

/// Repository-side page selection with decoded ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPageFilter {
    pub ids: Option<Vec<i64>>,
    pub trashed: Trashed,
    pub page: PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(slug: &str) -> CreateCategory {
        CreateCategory {
            name: BTreeMap::from([("en".to_string(), "Shoes".to_string())]),
            slug: slug.to_string(),
            parent_id: None,
            channel: None,
        }
    }

    #[test]
    fn slug_pattern() {
        assert!(create("summer-sale-2024").validate().is_ok());
        assert!(create("Summer Sale").validate().is_err());
        assert!(create("double--dash").validate().is_err());
        assert!(create("-leading").validate().is_err());
    }

    #[test]
    fn name_needs_a_non_blank_translation() {
        let mut input = create("shoes");
        input.name.clear();
        assert!(input.validate().is_err());

        input.name.insert("en".to_string(), "  ".to_string());
        assert!(input.validate().is_err());
    }

    #[test]
    fn list_query_parses_ids_and_pages() {
        let query = CategoryListQuery {
            ids: Some("abc, def,,".to_string()),
            per_page: Some(500),
            ..Default::default()
        };
        assert_eq!(query.id_tokens(), vec!["abc", "def"]);
        assert_eq!(query.page().per_page, core_model::pagination::MAX_PER_PAGE);
        assert_eq!(query.page().current_page, 1);
    }

    #[test]
    fn internal_keys_are_not_serialized() {
        let category = Category {
            key: 41,
            id: "hashed".to_string(),
            name: BTreeMap::new(),
            slug: "s".to_string(),
            parent_key: Some(40),
            parent_id: Some("parent".to_string()),
            position: 0,
            channel: "webstore".to_string(),
            audit: AuditFields::default(),
            created_at: now_utc(),
            updated_at: now_utc(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&category).unwrap();
        assert!(json.get("key").is_none());
        assert!(json.get("parent_key").is_none());
        assert_eq!(json["id"], "hashed");
        assert!(json.get("created_by").is_some());
    }

    #[test]
    fn delete_strategy_defaults_to_forbid() {
        let query: DeleteCategoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.children, ChildrenStrategy::Forbid);
        assert_eq!("reparent".parse::<ChildrenStrategy>().unwrap(), ChildrenStrategy::Reparent);
    }
}
