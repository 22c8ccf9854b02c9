use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, ScopeExt, Trashed, now_utc,
};
use database::BaseRepository;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

use crate::{
    entity,
    error::{CategoryError, CategoryResult},
    models::{Category, CategoryPageFilter, ChildrenStrategy, NewCategory, UpdateCategory},
    repository::{CategoryRepository, decode, draft, relocate},
    tree::{self, Move, Slot},
};

type Base = BaseRepository<entity::Entity>;

fn internal(e: DbErr) -> CategoryError {
    CategoryError::Internal(format!("Database error: {}", e))
}

/// Unique index violations surface as slug conflicts
fn slug_conflict(slug: &str) -> impl FnOnce(DbErr) -> CategoryError + '_ {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => CategoryError::DuplicateSlug(slug.to_string()),
        _ => internal(e),
    }
}

pub struct PgCategoryRepository {
    base: Base,
    codec: HashIdCodec,
    lifecycle: Lifecycle<Category>,
    position_base: i32,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection, codec: HashIdCodec) -> Self {
        Self {
            base: BaseRepository::new(db),
            codec,
            lifecycle: Lifecycle::audited(),
            position_base: 0,
        }
    }

    pub fn with_position_base(mut self, base: i32) -> Self {
        self.position_base = base;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<Category>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// `SELECT ... FOR UPDATE` over the live rows of a channel
    async fn lock_channel(
        &self,
        txn: &DatabaseTransaction,
        channel: &str,
    ) -> CategoryResult<Vec<Category>> {
        let rows = entity::Entity::find()
            .filter(entity::Column::Channel.eq(channel))
            .trashed(entity::Column::DeletedAt, Trashed::Without)
            .order_by_asc(entity::Column::Id)
            .lock_exclusive()
            .all(txn)
            .await
            .map_err(internal)?;

        Ok(rows.into_iter().map(|m| m.into_category(&self.codec)).collect())
    }

    async fn save_in(
        &self,
        txn: &DatabaseTransaction,
        category: &mut Category,
        ctx: &RequestContext,
    ) -> CategoryResult<()> {
        self.lifecycle.before_save(SaveOp::Update, category, ctx)?;
        let model = Base::update_in(txn, entity::ActiveModel::from(&*category))
            .await
            .map_err(slug_conflict(&category.slug))?;
        *category = model.into_category(&self.codec);
        self.lifecycle.after_save(SaveOp::Update, category, ctx)?;
        Ok(())
    }

    async fn apply_moves(
        &self,
        txn: &DatabaseTransaction,
        locked: &[Category],
        moves: &[Move],
        ctx: &RequestContext,
    ) -> CategoryResult<()> {
        for step in moves {
            let mut category = locked
                .iter()
                .find(|c| c.key == step.id)
                .cloned()
                .ok_or_else(|| CategoryError::NotFound(step.id.to_string()))?;
            relocate(&mut category, step, &self.codec);
            self.save_in(txn, &mut category, ctx).await?;
        }
        Ok(())
    }
}

fn slots(categories: &[Category]) -> Vec<Slot> {
    categories.iter().map(Slot::from).collect()
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    fn decode_id(&self, hashed: &str) -> CategoryResult<i64> {
        decode(&self.codec, hashed)
    }

    async fn find(&self, id: i64, trashed: Trashed) -> CategoryResult<Option<Category>> {
        let model = entity::Entity::find_by_id(id)
            .trashed(entity::Column::DeletedAt, trashed)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_category(&self.codec)))
    }

    async fn list_channel(&self, channel: &str) -> CategoryResult<Vec<Category>> {
        let models = entity::Entity::find()
            .filter(entity::Column::Channel.eq(channel))
            .trashed(entity::Column::DeletedAt, Trashed::Without)
            .order_by_asc(entity::Column::Position)
            .order_by_asc(entity::Column::Id)
            .all(self.base.db())
            .await
            .map_err(internal)?;

        Ok(models.into_iter().map(|m| m.into_category(&self.codec)).collect())
    }

    async fn children_of(
        &self,
        channel: &str,
        parent: Option<i64>,
    ) -> CategoryResult<Vec<Category>> {
        let parent_filter = match parent {
            Some(id) => entity::Column::ParentId.eq(id),
            None => entity::Column::ParentId.is_null(),
        };

        let models = entity::Entity::find()
            .filter(entity::Column::Channel.eq(channel))
            .filter(parent_filter)
            .trashed(entity::Column::DeletedAt, Trashed::Without)
            .order_by_asc(entity::Column::Position)
            .order_by_asc(entity::Column::Id)
            .all(self.base.db())
            .await
            .map_err(internal)?;

        Ok(models.into_iter().map(|m| m.into_category(&self.codec)).collect())
    }

    async fn paginate(&self, filter: CategoryPageFilter) -> CategoryResult<(Vec<Category>, u64)> {
        let mut query = entity::Entity::find().trashed(entity::Column::DeletedAt, filter.trashed);
        if let Some(ids) = filter.ids {
            query = query.filter(entity::Column::Id.is_in(ids));
        }

        let total = query.clone().count(self.base.db()).await.map_err(internal)?;
        let models = query
            .order_by_asc(entity::Column::Id)
            .offset(filter.page.offset())
            .limit(filter.page.limit())
            .all(self.base.db())
            .await
            .map_err(internal)?;

        Ok((
            models.into_iter().map(|m| m.into_category(&self.codec)).collect(),
            total,
        ))
    }

    async fn slug_taken(
        &self,
        channel: &str,
        slug: &str,
        except: Option<i64>,
    ) -> CategoryResult<bool> {
        let mut query = entity::Entity::find()
            .filter(entity::Column::Channel.eq(channel))
            .filter(entity::Column::Slug.eq(slug))
            .trashed(entity::Column::DeletedAt, Trashed::Without);
        if let Some(id) = except {
            query = query.filter(entity::Column::Id.ne(id));
        }

        let count = query.count(self.base.db()).await.map_err(internal)?;
        Ok(count > 0)
    }

    async fn create(&self, ctx: &RequestContext, input: NewCategory) -> CategoryResult<Category> {
        let txn = self.base.begin().await.map_err(internal)?;
        let locked = self.lock_channel(&txn, &input.channel).await?;

        if let Some(parent) = input.parent {
            if !locked.iter().any(|c| c.key == parent) {
                return Err(CategoryError::NotFound(parent.to_string()));
            }
        }
        if locked.iter().any(|c| c.slug == input.slug) {
            return Err(CategoryError::DuplicateSlug(input.slug));
        }

        let position = tree::next_position(&slots(&locked), input.parent, self.position_base);
        let mut category = draft(input, position, &self.codec);

        self.lifecycle.before_save(SaveOp::Create, &mut category, ctx)?;
        let model = Base::insert_in(&txn, entity::insert_model(&category))
            .await
            .map_err(slug_conflict(&category.slug))?;
        let mut category = model.into_category(&self.codec);
        self.lifecycle.after_save(SaveOp::Create, &mut category, ctx)?;

        txn.commit().await.map_err(internal)?;

        tracing::info!(category_id = %category.id, channel = %category.channel, position, "Created category");
        Ok(category)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateCategory,
    ) -> CategoryResult<Category> {
        let mut category = self
            .find(id, Trashed::Without)
            .await?
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;

        if let Some(slug) = input.slug.as_ref() {
            if self.slug_taken(&category.channel, slug, Some(id)).await? {
                return Err(CategoryError::DuplicateSlug(slug.clone()));
            }
        }

        category.apply_update(input);
        self.lifecycle.before_save(SaveOp::Update, &mut category, ctx)?;
        let model = self
            .base
            .update(entity::ActiveModel::from(&category))
            .await
            .map_err(slug_conflict(&category.slug))?;
        let mut category = model.into_category(&self.codec);
        self.lifecycle.after_save(SaveOp::Update, &mut category, ctx)?;

        tracing::info!(category_id = %category.id, "Updated category");
        Ok(category)
    }

    async fn reorder(
        &self,
        ctx: &RequestContext,
        channel: &str,
        parent: Option<i64>,
        siblings: Vec<i64>,
    ) -> CategoryResult<()> {
        let txn = self.base.begin().await.map_err(internal)?;
        let locked = self.lock_channel(&txn, channel).await?;

        let moves = tree::plan_reorder(&slots(&locked), parent, &siblings, self.position_base)?;
        self.apply_moves(&txn, &locked, &moves, ctx).await?;

        txn.commit().await.map_err(internal)?;

        tracing::info!(channel, moved = moves.len(), "Reordered categories");
        Ok(())
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        id: i64,
        strategy: ChildrenStrategy,
    ) -> CategoryResult<Vec<i64>> {
        let txn = self.base.begin().await.map_err(internal)?;
        let channel = Base::find_by_id_in(&txn, id)
            .await
            .map_err(internal)?
            .filter(|m| m.deleted_at.is_none())
            .map(|m| m.channel)
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;

        let locked = self.lock_channel(&txn, &channel).await?;
        let plan = tree::plan_delete(&slots(&locked), id, strategy, self.position_base)?;

        for key in &plan.trash {
            let mut category = locked
                .iter()
                .find(|c| c.key == *key)
                .cloned()
                .ok_or_else(|| CategoryError::NotFound(key.to_string()))?;

            self.lifecycle.fire(LifecycleEvent::Deleting, &mut category, ctx)?;
            category.deleted_at = Some(now_utc());
            category.touch();
            let model = Base::update_in(&txn, entity::ActiveModel::from(&category))
                .await
                .map_err(internal)?;
            let mut category = model.into_category(&self.codec);
            self.lifecycle.fire(LifecycleEvent::Deleted, &mut category, ctx)?;
        }
        self.apply_moves(&txn, &locked, &plan.moves, ctx).await?;

        txn.commit().await.map_err(internal)?;

        tracing::info!(category_id = id, %strategy, trashed = plan.trash.len(), "Deleted category");
        Ok(plan.trash)
    }

    async fn restore(&self, ctx: &RequestContext, id: i64) -> CategoryResult<Category> {
        let txn = self.base.begin().await.map_err(internal)?;
        let mut category = Base::find_by_id_in(&txn, id)
            .await
            .map_err(internal)?
            .map(|m| m.into_category(&self.codec))
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;

        if !category.is_trashed() {
            return Err(CategoryError::Unprocessable("Category is not trashed".to_string()));
        }

        let locked = self.lock_channel(&txn, &category.channel).await?;
        if let Some(parent) = category.parent_key {
            if !locked.iter().any(|c| c.key == parent) {
                return Err(CategoryError::Unprocessable(
                    "Restore the parent category first".to_string(),
                ));
            }
        }
        if locked.iter().any(|c| c.slug == category.slug) {
            return Err(CategoryError::DuplicateSlug(category.slug));
        }

        let position =
            tree::next_position(&slots(&locked), category.parent_key, self.position_base);

        self.lifecycle.fire(LifecycleEvent::Restoring, &mut category, ctx)?;
        category.deleted_at = None;
        category.position = position;
        category.touch();
        self.save_in(&txn, &mut category, ctx).await?;
        self.lifecycle.fire(LifecycleEvent::Restored, &mut category, ctx)?;

        txn.commit().await.map_err(internal)?;

        tracing::info!(category_id = %category.id, position, "Restored category");
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    fn row(id: i64, parent: Option<i64>, position: i32) -> entity::Model {
        let now = now_utc();
        entity::Model {
            id,
            name: serde_json::json!({ "en": format!("c{}", id) }),
            slug: format!("c{}", id),
            parent_id: parent,
            position,
            channel: "webstore".to_string(),
            created_by: None,
            created_ip: None,
            updated_by: None,
            updated_ip: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn models_carry_hashed_ids() {
        let codec = HashIdCodec::new("pg", 8);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(7, Some(3), 1)]])
            .into_connection();
        let repo = PgCategoryRepository::new(db, codec.clone());

        let found = repo.find(7, Trashed::Without).await.unwrap().unwrap();
        assert_eq!(found.id, codec.encode(7));
        assert_eq!(found.parent_id, Some(codec.encode(3)));
        assert_eq!(
            found.name,
            BTreeMap::from([("en".to_string(), "c7".to_string())])
        );
    }

    #[tokio::test]
    async fn reorder_rejects_cycles_before_writing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(1, None, 0), row(2, Some(1), 0)]])
            .into_connection();
        let repo = PgCategoryRepository::new(db, HashIdCodec::new("pg", 8));

        let err = repo
            .reorder(&RequestContext::system(), "webstore", Some(2), vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Cycle));
    }
}
