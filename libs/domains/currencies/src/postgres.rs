use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, ScopeExt, Trashed, now_utc,
};
use database::BaseRepository;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

use crate::{
    entity,
    error::{CurrencyError, CurrencyResult},
    models::{CreateCurrency, Currency, CurrencyFilter, UpdateCurrency},
    repository::{CurrencyRepository, decode, draft},
};

type Base = BaseRepository<entity::Entity>;

fn internal(e: DbErr) -> CurrencyError {
    CurrencyError::Internal(format!("Database error: {}", e))
}

fn code_conflict(code: &str) -> impl FnOnce(DbErr) -> CurrencyError + '_ {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => CurrencyError::DuplicateCode(code.to_string()),
        _ => internal(e),
    }
}

pub struct PgCurrencyRepository {
    base: Base,
    codec: HashIdCodec,
    lifecycle: Lifecycle<Currency>,
}

impl PgCurrencyRepository {
    pub fn new(db: DatabaseConnection, codec: HashIdCodec) -> Self {
        Self {
            base: BaseRepository::new(db),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<Currency>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Clear the default flag on every live currency except `keep`
    async fn demote<C: ConnectionTrait>(
        &self,
        conn: &C,
        keep: Option<i64>,
        ctx: &RequestContext,
    ) -> CurrencyResult<u64> {
        let mut query = entity::Entity::update_many()
            .col_expr(entity::Column::IsDefault, Expr::value(false))
            .col_expr(entity::Column::UpdatedBy, Expr::value(ctx.user_id))
            .col_expr(entity::Column::UpdatedIp, Expr::value(ctx.ip.clone()))
            .filter(entity::Column::IsDefault.eq(true))
            .trashed(entity::Column::DeletedAt, Trashed::Without);
        if let Some(id) = keep {
            query = query.filter(entity::Column::Id.ne(id));
        }

        let result = query.exec(conn).await.map_err(internal)?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl CurrencyRepository for PgCurrencyRepository {
    fn decode_id(&self, hashed: &str) -> CurrencyResult<i64> {
        decode(&self.codec, hashed)
    }

    async fn list(&self, filter: CurrencyFilter) -> CurrencyResult<Vec<Currency>> {
        let mut query = entity::Entity::find().trashed(entity::Column::DeletedAt, filter.trashed);
        if let Some(enabled) = filter.enabled {
            query = query.filter(entity::Column::Enabled.eq(enabled));
        }

        let models = query
            .order_by_asc(entity::Column::Id)
            .all(self.base.db())
            .await
            .map_err(internal)?;

        Ok(models.into_iter().map(|m| m.into_currency(&self.codec)).collect())
    }

    async fn find(&self, id: i64, trashed: Trashed) -> CurrencyResult<Option<Currency>> {
        let model = entity::Entity::find_by_id(id)
            .trashed(entity::Column::DeletedAt, trashed)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_currency(&self.codec)))
    }

    async fn find_by_code(&self, code: &str) -> CurrencyResult<Option<Currency>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Code.eq(code))
            .trashed(entity::Column::DeletedAt, Trashed::Without)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_currency(&self.codec)))
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateCurrency,
    ) -> CurrencyResult<Currency> {
        let code = input.code.clone();
        let mut currency = draft(input);
        self.lifecycle.before_save(SaveOp::Create, &mut currency, ctx)?;

        let txn = self.base.begin().await.map_err(internal)?;
        if currency.default {
            self.demote(&txn, None, ctx).await?;
        }
        let model = Base::insert_in(&txn, entity::insert_model(&currency))
            .await
            .map_err(code_conflict(&code))?;
        let mut currency = model.into_currency(&self.codec);
        self.lifecycle.after_save(SaveOp::Create, &mut currency, ctx)?;
        txn.commit().await.map_err(internal)?;

        tracing::info!(currency_id = %currency.id, code = %currency.code, "Created currency");
        Ok(currency)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateCurrency,
    ) -> CurrencyResult<Currency> {
        let mut currency = self
            .find(id, Trashed::Without)
            .await?
            .ok_or_else(|| CurrencyError::NotFound(id.to_string()))?;

        currency.apply_update(input);
        self.lifecycle.before_save(SaveOp::Update, &mut currency, ctx)?;
        let model = self
            .base
            .update(entity::ActiveModel::from(&currency))
            .await
            .map_err(code_conflict(&currency.code))?;
        let mut currency = model.into_currency(&self.codec);
        self.lifecycle.after_save(SaveOp::Update, &mut currency, ctx)?;

        tracing::info!(currency_id = %currency.id, "Updated currency");
        Ok(currency)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> CurrencyResult<()> {
        let mut currency = self
            .find(id, Trashed::Without)
            .await?
            .ok_or_else(|| CurrencyError::NotFound(id.to_string()))?;

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut currency, ctx)?;
        currency.deleted_at = Some(now_utc());
        currency.touch();
        let model = self
            .base
            .update(entity::ActiveModel::from(&currency))
            .await
            .map_err(internal)?;
        let mut currency = model.into_currency(&self.codec);
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut currency, ctx)?;

        tracing::info!(currency_id = %currency.id, "Deleted currency");
        Ok(())
    }

    async fn set_default(&self, ctx: &RequestContext, id: i64) -> CurrencyResult<Currency> {
        let txn = self.base.begin().await.map_err(internal)?;
        let mut currency = entity::Entity::find_by_id(id)
            .trashed(entity::Column::DeletedAt, Trashed::Without)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(internal)?
            .map(|m| m.into_currency(&self.codec))
            .ok_or_else(|| CurrencyError::NotFound(id.to_string()))?;

        let demoted = self.demote(&txn, Some(id), ctx).await?;
        if !currency.default {
            currency.default = true;
            currency.touch();
            self.lifecycle.before_save(SaveOp::Update, &mut currency, ctx)?;
            let model = Base::update_in(&txn, entity::ActiveModel::from(&currency))
                .await
                .map_err(internal)?;
            currency = model.into_currency(&self.codec);
            self.lifecycle.after_save(SaveOp::Update, &mut currency, ctx)?;
        }
        txn.commit().await.map_err(internal)?;

        tracing::info!(currency_id = %currency.id, code = %currency.code, demoted, "Set default currency");
        Ok(currency)
    }
}
