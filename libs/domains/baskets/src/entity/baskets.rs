use core_model::{AuditFields, HashIdCodec, to_utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Basket, BasketLine};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "baskets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub currency: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub lines: Json,
    pub merged_id: Option<i64>,
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
    pub fn into_basket(self, codec: &HashIdCodec) -> Basket {
        let lines: Vec<BasketLine> = serde_json::from_value(self.lines).unwrap_or_default();
        let mut basket = Basket {
            key: self.id,
            id: codec.encode(self.id),
            user_id: self.user_id,
            currency: self.currency,
            lines,
            total: Decimal::ZERO,
            merged_key: self.merged_id,
            merged_id: self.merged_id.map(|m| codec.encode(m)),
            audit: AuditFields::from_columns(
                self.created_by,
                self.created_ip,
                self.updated_by,
                self.updated_ip,
            ),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        };
        basket.recalculate();
        basket
    }
}

impl From<&Basket> for ActiveModel {
    fn from(basket: &Basket) -> Self {
        ActiveModel {
            id: Unchanged(basket.key),
            user_id: Set(basket.user_id),
            currency: Set(basket.currency.clone()),
            lines: Set(serde_json::to_value(&basket.lines).unwrap_or_default()),
            merged_id: Set(basket.merged_key),
            created_by: Set(basket.audit.created_by),
            created_ip: Set(basket.audit.created_ip.clone()),
            updated_by: Set(basket.audit.updated_by),
            updated_ip: Set(basket.audit.updated_ip.clone()),
            created_at: Set(to_utc(basket.created_at)),
            updated_at: Set(to_utc(basket.updated_at)),
            deleted_at: Set(basket.deleted_at.map(to_utc)),
        }
    }
}

pub fn insert_model(draft: &Basket) -> ActiveModel {
    let mut model = ActiveModel::from(draft);
    model.id = NotSet;
    model
}
