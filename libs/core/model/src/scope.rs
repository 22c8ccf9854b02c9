//! Reusable query predicates.
//!
//! [`ScopeExt`] adds the scopes to any sea-orm query; in-memory repositories
//! apply the same rules through [`Trashed::admits`].

use sea_orm::{ColumnTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Soft delete visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trashed {
    /// Live rows only
    #[default]
    Without,
    /// Live and trashed rows
    With,
    /// Trashed rows only
    Only,
}

impl Trashed {
    pub fn admits<T>(self, deleted_at: Option<&T>) -> bool {
        match self {
            Self::Without => deleted_at.is_none(),
            Self::With => true,
            Self::Only => deleted_at.is_some(),
        }
    }
}

pub trait ScopeExt: QueryFilter + Sized {
    fn trashed<C: ColumnTrait>(self, deleted_at: C, mode: Trashed) -> Self {
        match mode {
            Trashed::Without => self.filter(deleted_at.is_null()),
            Trashed::With => self,
            Trashed::Only => self.filter(deleted_at.is_not_null()),
        }
    }

    fn enabled<C: ColumnTrait>(self, enabled: C) -> Self {
        self.filter(enabled.eq(true))
    }

    fn default_only<C: ColumnTrait>(self, default: C) -> Self {
        self.filter(default.eq(true))
    }

    /// Rows whose `disabled_at` marker is unset
    fn not_disabled<C: ColumnTrait>(self, disabled_at: C) -> Self {
        self.filter(disabled_at.is_null())
    }
}

impl<Q: QueryFilter> ScopeExt for Q {}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryTrait};

    mod widget {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "widgets")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub enabled: bool,
            pub deleted_at: Option<DateTimeWithTimeZone>,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    fn sql(query: sea_orm::Select<widget::Entity>) -> String {
        query.build(DbBackend::Postgres).to_string()
    }

    #[test]
    fn default_trashed_mode_hides_deleted_rows() {
        let q = widget::Entity::find().trashed(widget::Column::DeletedAt, Trashed::default());
        assert!(sql(q).contains(r#""deleted_at" IS NULL"#));
    }

    #[test]
    fn only_trashed_selects_deleted_rows() {
        let q = widget::Entity::find().trashed(widget::Column::DeletedAt, Trashed::Only);
        assert!(sql(q).contains(r#""deleted_at" IS NOT NULL"#));

        let all = widget::Entity::find().trashed(widget::Column::DeletedAt, Trashed::With);
        assert!(!sql(all).contains("WHERE"));
    }

    #[test]
    fn enabled_scope_filters_flag() {
        let q = widget::Entity::find().enabled(widget::Column::Enabled);
        assert!(sql(q).contains(r#""enabled" = TRUE"#));
    }

    #[test]
    fn admits_mirrors_the_sql_scopes() {
        let stamp = Some(&1);
        assert!(Trashed::Without.admits::<i32>(None));
        assert!(!Trashed::Without.admits(stamp));
        assert!(Trashed::With.admits(stamp));
        assert!(Trashed::Only.admits(stamp));
        assert!(!Trashed::Only.admits::<i32>(None));
    }

    #[test]
    fn parses_lowercase_query_values() {
        let mode: Trashed = serde_json::from_str(r#""only""#).unwrap();
        assert_eq!(mode, Trashed::Only);
    }
}
