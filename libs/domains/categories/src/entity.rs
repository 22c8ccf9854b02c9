use core_model::{AuditFields, HashIdCodec, to_utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::Category;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub name: Json,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub position: i32,
    pub channel: String,
    pub created_by: Option<i64>,
    pub created_ip: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_ip: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Domain view with hashed ids stamped from `codec`
    pub fn into_category(self, codec: &HashIdCodec) -> Category {
        Category {
            key: self.id,
            id: codec.encode(self.id),
            name: serde_json::from_value(self.name).unwrap_or_default(),
            slug: self.slug,
            parent_key: self.parent_id,
            parent_id: self.parent_id.map(|p| codec.encode(p)),
            position: self.position,
            channel: self.channel,
            audit: AuditFields::from_columns(
                self.created_by,
                self.created_ip,
                self.updated_by,
                self.updated_ip,
            ),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// Every column of an existing category, keyed by its id
impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        ActiveModel {
            id: Unchanged(category.key),
            name: Set(serde_json::to_value(&category.name).unwrap_or_default()),
            slug: Set(category.slug.clone()),
            parent_id: Set(category.parent_key),
            position: Set(category.position),
            channel: Set(category.channel.clone()),
            created_by: Set(category.audit.created_by),
            created_ip: Set(category.audit.created_ip.clone()),
            updated_by: Set(category.audit.updated_by),
            updated_ip: Set(category.audit.updated_ip.clone()),
            created_at: Set(to_utc(category.created_at)),
            updated_at: Set(to_utc(category.updated_at)),
            deleted_at: Set(category.deleted_at.map(to_utc)),
        }
    }
}

/// Insert form of a draft category: the database assigns the id
pub fn insert_model(draft: &Category) -> ActiveModel {
    let mut model = ActiveModel::from(draft);
    model.id = NotSet;
    model
}
