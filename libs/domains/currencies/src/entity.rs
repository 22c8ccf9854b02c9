use core_model::{AuditFields, HashIdCodec, to_utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::Currency;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub code: String,
    pub name: String,
    pub enabled: bool,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub exchange_rate: Decimal,
    pub format: String,
    pub decimal_point: String,
    pub thousand_point: String,
    #[sea_orm(column_name = "default")]
    pub is_default: bool,
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
    pub fn into_currency(self, codec: &HashIdCodec) -> Currency {
        Currency {
            key: self.id,
            id: codec.encode(self.id),
            code: self.code,
            name: self.name,
            enabled: self.enabled,
            exchange_rate: self.exchange_rate,
            format: self.format,
            decimal_point: self.decimal_point,
            thousand_point: self.thousand_point,
            default: self.is_default,
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

impl From<&Currency> for ActiveModel {
    fn from(currency: &Currency) -> Self {
        ActiveModel {
            id: Unchanged(currency.key),
            code: Set(currency.code.clone()),
            name: Set(currency.name.clone()),
            enabled: Set(currency.enabled),
            exchange_rate: Set(currency.exchange_rate),
            format: Set(currency.format.clone()),
            decimal_point: Set(currency.decimal_point.clone()),
            thousand_point: Set(currency.thousand_point.clone()),
            is_default: Set(currency.default),
            created_by: Set(currency.audit.created_by),
            created_ip: Set(currency.audit.created_ip.clone()),
            updated_by: Set(currency.audit.updated_by),
            updated_ip: Set(currency.audit.updated_ip.clone()),
            created_at: Set(to_utc(currency.created_at)),
            updated_at: Set(to_utc(currency.updated_at)),
            deleted_at: Set(currency.deleted_at.map(to_utc)),
        }
    }
}

pub fn insert_model(draft: &Currency) -> ActiveModel {
    let mut model = ActiveModel::from(draft);
    model.id = NotSet;
    model
}
