use core_model::{AuditFields, HashIdCodec, to_utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::AssetSource;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_sources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub handle: String,
    pub disk: String,
    #[sea_orm(column_name = "default")]
    pub is_default: bool,
    pub bucket: Option<String>,
    pub path: Option<String>,
    pub created_by: Option<i64>,
    pub created_ip: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_ip: Option<String>,
    pub disabled_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_asset_source(self, codec: &HashIdCodec) -> AssetSource {
        AssetSource {
            key: self.id,
            id: codec.encode(self.id),
            name: self.name,
            handle: self.handle,
            disk: self.disk,
            default: self.is_default,
            bucket: self.bucket,
            path: self.path,
            audit: AuditFields::from_columns(
                self.created_by,
                self.created_ip,
                self.updated_by,
                self.updated_ip,
            ),
            disabled_at: self.disabled_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

impl From<&AssetSource> for ActiveModel {
    fn from(source: &AssetSource) -> Self {
        ActiveModel {
            id: Unchanged(source.key),
            name: Set(source.name.clone()),
            handle: Set(source.handle.clone()),
            disk: Set(source.disk.clone()),
            is_default: Set(source.default),
            bucket: Set(source.bucket.clone()),
            path: Set(source.path.clone()),
            created_by: Set(source.audit.created_by),
            created_ip: Set(source.audit.created_ip.clone()),
            updated_by: Set(source.audit.updated_by),
            updated_ip: Set(source.audit.updated_ip.clone()),
            disabled_at: Set(source.disabled_at.map(to_utc)),
            created_at: Set(to_utc(source.created_at)),
            updated_at: Set(to_utc(source.updated_at)),
            deleted_at: Set(source.deleted_at.map(to_utc)),
        }
    }
}

pub fn insert_model(draft: &AssetSource) -> ActiveModel {
    let mut model = ActiveModel::from(draft);
    model.id = NotSet;
    model
}
