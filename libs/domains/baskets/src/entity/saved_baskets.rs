use core_model::{AuditFields, HashIdCodec, to_utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::SavedBasket;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "saved_baskets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub basket_id: i64,
    pub name: String,
    pub user_id: i64,
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
    pub fn into_saved_basket(self, codec: &HashIdCodec) -> SavedBasket {
        SavedBasket {
            key: self.id,
            id: codec.encode(self.id),
            basket_key: self.basket_id,
            basket_id: codec.encode(self.basket_id),
            name: self.name,
            user_id: self.user_id,
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

impl From<&SavedBasket> for ActiveModel {
    fn from(saved: &SavedBasket) -> Self {
        ActiveModel {
            id: Unchanged(saved.key),
            basket_id: Set(saved.basket_key),
            name: Set(saved.name.clone()),
            user_id: Set(saved.user_id),
            created_by: Set(saved.audit.created_by),
            created_ip: Set(saved.audit.created_ip.clone()),
            updated_by: Set(saved.audit.updated_by),
            updated_ip: Set(saved.audit.updated_ip.clone()),
            created_at: Set(to_utc(saved.created_at)),
            updated_at: Set(to_utc(saved.updated_at)),
            deleted_at: Set(saved.deleted_at.map(to_utc)),
        }
    }
}

pub fn insert_model(draft: &SavedBasket) -> ActiveModel {
    let mut model = ActiveModel::from(draft);
    model.id = NotSet;
    model
}
