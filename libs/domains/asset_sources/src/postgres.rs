use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, ScopeExt, Trashed, now_utc,
};
use database::BaseRepository;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr,
};

use crate::{
    entity,
    error::{AssetSourceError, AssetSourceResult},
    models::{AssetSource, AssetSourceFilter, CreateAssetSource, UpdateAssetSource},
    repository::{AssetSourceRepository, decode, draft},
};

type Base = BaseRepository<entity::Entity>;

fn internal(e: DbErr) -> AssetSourceError {
    AssetSourceError::Internal(format!("Database error: {}", e))
}

fn handle_conflict(handle: &str) -> impl FnOnce(DbErr) -> AssetSourceError + '_ {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AssetSourceError::DuplicateHandle(handle.to_string())
        }
        _ => internal(e),
    }
}

pub struct PgAssetSourceRepository {
    base: Base,
    codec: HashIdCodec,
    lifecycle: Lifecycle<AssetSource>,
}

impl PgAssetSourceRepository {
    pub fn new(db: DatabaseConnection, codec: HashIdCodec) -> Self {
        Self {
            base: BaseRepository::new(db),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<AssetSource>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    async fn load(&self, id: i64, trashed: Trashed) -> AssetSourceResult<AssetSource> {
        self.find(id, trashed)
            .await?
            .ok_or_else(|| AssetSourceError::NotFound(id.to_string()))
    }

    /// Clear the default flag on the live sources of `disk` except `keep`
    async fn demote<C: ConnectionTrait>(
        &self,
        conn: &C,
        disk: &str,
        keep: i64,
        ctx: &RequestContext,
    ) -> AssetSourceResult<u64> {
        let result = entity::Entity::update_many()
            .col_expr(entity::Column::IsDefault, Expr::value(false))
            .col_expr(entity::Column::UpdatedBy, Expr::value(ctx.user_id))
            .col_expr(entity::Column::UpdatedIp, Expr::value(ctx.ip.clone()))
            .col_expr(entity::Column::UpdatedAt, Expr::value(now_utc()))
            .filter(entity::Column::IsDefault.eq(true))
            .filter(entity::Column::Disk.eq(disk))
            .filter(entity::Column::Id.ne(keep))
            .trashed(entity::Column::DeletedAt, Trashed::Without)
            .exec(conn)
            .await
            .map_err(internal)?;
        Ok(result.rows_affected)
    }

    /// Write `source` in one transaction with the demotion of its disk siblings
    async fn save(
        &self,
        ctx: &RequestContext,
        mut source: AssetSource,
    ) -> AssetSourceResult<AssetSource> {
        self.lifecycle.before_save(SaveOp::Update, &mut source, ctx)?;

        let txn = self.base.begin().await.map_err(internal)?;
        if source.default && !source.is_trashed() {
            self.demote(&txn, &source.disk, source.key, ctx).await?;
        }
        let model = Base::update_in(&txn, entity::ActiveModel::from(&source))
            .await
            .map_err(handle_conflict(&source.handle))?;
        txn.commit().await.map_err(internal)?;

        let mut source = model.into_asset_source(&self.codec);
        self.lifecycle.after_save(SaveOp::Update, &mut source, ctx)?;
        Ok(source)
    }
}

#[async_trait]
impl AssetSourceRepository for PgAssetSourceRepository {
    fn decode_id(&self, hashed: &str) -> AssetSourceResult<i64> {
        decode(&self.codec, hashed)
    }

    async fn list(&self, filter: AssetSourceFilter) -> AssetSourceResult<Vec<AssetSource>> {
        let mut query = entity::Entity::find().trashed(entity::Column::DeletedAt, filter.trashed);
        match filter.enabled {
            Some(true) => query = query.filter(entity::Column::DisabledAt.is_null()),
            Some(false) => query = query.filter(entity::Column::DisabledAt.is_not_null()),
            None => {}
        }
        if let Some(disk) = filter.disk {
            query = query.filter(entity::Column::Disk.eq(disk));
        }

        let models = query
            .order_by_asc(entity::Column::Id)
            .all(self.base.db())
            .await
            .map_err(internal)?;

        Ok(models
            .into_iter()
            .map(|m| m.into_asset_source(&self.codec))
            .collect())
    }

    async fn find(&self, id: i64, trashed: Trashed) -> AssetSourceResult<Option<AssetSource>> {
        let model = entity::Entity::find_by_id(id)
            .trashed(entity::Column::DeletedAt, trashed)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_asset_source(&self.codec)))
    }

    async fn find_by_handle(&self, handle: &str) -> AssetSourceResult<Option<AssetSource>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Handle.eq(handle))
            .trashed(entity::Column::DeletedAt, Trashed::Without)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_asset_source(&self.codec)))
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateAssetSource,
    ) -> AssetSourceResult<AssetSource> {
        let mut source = draft(input);
        self.lifecycle.before_save(SaveOp::Create, &mut source, ctx)?;

        let txn = self.base.begin().await.map_err(internal)?;
        let model = Base::insert_in(&txn, entity::insert_model(&source))
            .await
            .map_err(handle_conflict(&source.handle))?;
        if model.is_default {
            self.demote(&txn, &model.disk, model.id, ctx).await?;
        }
        txn.commit().await.map_err(internal)?;

        let mut source = model.into_asset_source(&self.codec);
        self.lifecycle.after_save(SaveOp::Create, &mut source, ctx)?;

        tracing::info!(asset_source_id = %source.id, handle = %source.handle, "Created asset source");
        Ok(source)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateAssetSource,
    ) -> AssetSourceResult<AssetSource> {
        let mut source = self.load(id, Trashed::Without).await?;
        source.apply_update(input);
        let source = self.save(ctx, source).await?;

        tracing::info!(asset_source_id = %source.id, "Updated asset source");
        Ok(source)
    }

    async fn set_disabled(
        &self,
        ctx: &RequestContext,
        id: i64,
        disabled: bool,
    ) -> AssetSourceResult<AssetSource> {
        let mut source = self.load(id, Trashed::Without).await?;
        source.disabled_at = disabled.then(now_utc);
        source.touch();
        let source = self.save(ctx, source).await?;

        tracing::info!(asset_source_id = %source.id, disabled, "Toggled asset source");
        Ok(source)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<()> {
        let mut source = self.load(id, Trashed::Without).await?;

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut source, ctx)?;
        source.deleted_at = Some(now_utc());
        source.touch();
        let model = self
            .base
            .update(entity::ActiveModel::from(&source))
            .await
            .map_err(internal)?;
        let mut source = model.into_asset_source(&self.codec);
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut source, ctx)?;

        tracing::info!(asset_source_id = %source.id, "Deleted asset source");
        Ok(())
    }

    async fn restore(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<AssetSource> {
        let mut source = self.load(id, Trashed::Only).await?;

        if self.find_by_handle(&source.handle).await?.is_some() {
            return Err(AssetSourceError::DuplicateHandle(source.handle));
        }
        if source.default {
            let live_defaults = entity::Entity::find()
                .filter(entity::Column::IsDefault.eq(true))
                .filter(entity::Column::Disk.eq(source.disk.as_str()))
                .trashed(entity::Column::DeletedAt, Trashed::Without)
                .count(self.base.db())
                .await
                .map_err(internal)?;
            source.default = live_defaults == 0;
        }

        self.lifecycle.fire(LifecycleEvent::Restoring, &mut source, ctx)?;
        source.deleted_at = None;
        source.touch();
        let mut source = self.save(ctx, source).await?;
        self.lifecycle.fire(LifecycleEvent::Restored, &mut source, ctx)?;

        tracing::info!(asset_source_id = %source.id, "Restored asset source");
        Ok(source)
    }

    async fn force_delete(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<()> {
        let mut source = self.load(id, Trashed::With).await?;

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut source, ctx)?;
        let removed = self.base.hard_delete(id).await.map_err(internal)?;
        if removed == 0 {
            return Err(AssetSourceError::NotFound(id.to_string()));
        }
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut source, ctx)?;

        tracing::info!(asset_source_id = %source.id, "Force deleted asset source");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn model(id: i64, handle: &str, deleted: bool) -> entity::Model {
        let now = now_utc();
        entity::Model {
            id,
            name: "Products".to_string(),
            handle: handle.to_string(),
            disk: "public".to_string(),
            is_default: false,
            bucket: None,
            path: None,
            created_by: None,
            created_ip: None,
            updated_by: None,
            updated_ip: None,
            disabled_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: deleted.then_some(now),
        }
    }

    #[tokio::test]
    async fn find_by_handle_encodes_ids() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(3, "products", false)]])
            .into_connection();
        let codec = HashIdCodec::new("mock", 8);
        let repo = PgAssetSourceRepository::new(db, codec.clone());

        let source = repo.find_by_handle("products").await.unwrap().unwrap();
        assert_eq!(source.key, 3);
        assert_eq!(source.id, codec.encode(3));
    }

    #[tokio::test]
    async fn force_delete_reaches_trashed_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(5, "products", true)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repo = PgAssetSourceRepository::new(db, HashIdCodec::new("mock", 8));

        repo.force_delete(&RequestContext::system(), 5).await.unwrap();
    }
}
