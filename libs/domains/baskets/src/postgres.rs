use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, ScopeExt, Trashed, now_utc,
};
use database::BaseRepository;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::{
    entity::{baskets, saved_baskets},
    error::{BasketError, BasketResult},
    models::{Basket, LineEdit, NewBasket, SavedBasket, UpdateSavedBasket},
    repository::{
        BasketRepository, SavedBasketRepository, decode_basket, decode_saved, saved_draft,
    },
};

type Baskets = BaseRepository<baskets::Entity>;
type SavedBaskets = BaseRepository<saved_baskets::Entity>;

fn internal(e: DbErr) -> BasketError {
    BasketError::Internal(format!("Database error: {}", e))
}

pub struct PgBasketRepository {
    base: Baskets,
    codec: HashIdCodec,
    lifecycle: Lifecycle<Basket>,
}

impl PgBasketRepository {
    pub fn new(db: DatabaseConnection, codec: HashIdCodec) -> Self {
        Self {
            base: BaseRepository::new(db),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<Basket>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    async fn locked<C: ConnectionTrait>(&self, conn: &C, id: i64) -> BasketResult<Basket> {
        baskets::Entity::find_by_id(id)
            .trashed(baskets::Column::DeletedAt, Trashed::Without)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(internal)?
            .map(|m| m.into_basket(&self.codec))
            .ok_or_else(|| BasketError::NotFound(id.to_string()))
    }

    async fn save_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        mut basket: Basket,
        ctx: &RequestContext,
    ) -> BasketResult<Basket> {
        self.lifecycle.before_save(SaveOp::Update, &mut basket, ctx)?;
        let model = Baskets::update_in(conn, baskets::ActiveModel::from(&basket))
            .await
            .map_err(internal)?;
        let mut basket = model.into_basket(&self.codec);
        self.lifecycle.after_save(SaveOp::Update, &mut basket, ctx)?;
        Ok(basket)
    }
}

#[async_trait]
impl BasketRepository for PgBasketRepository {
    fn decode_id(&self, hashed: &str) -> BasketResult<i64> {
        decode_basket(&self.codec, hashed)
    }

    async fn find(&self, id: i64, trashed: Trashed) -> BasketResult<Option<Basket>> {
        let model = baskets::Entity::find_by_id(id)
            .trashed(baskets::Column::DeletedAt, trashed)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_basket(&self.codec)))
    }

    async fn find_for_user(&self, user_id: i64) -> BasketResult<Option<Basket>> {
        let model = baskets::Entity::find()
            .filter(baskets::Column::UserId.eq(user_id))
            .trashed(baskets::Column::DeletedAt, Trashed::Without)
            .order_by_desc(baskets::Column::Id)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_basket(&self.codec)))
    }

    async fn create(&self, ctx: &RequestContext, new: NewBasket) -> BasketResult<Basket> {
        let mut basket = Basket::from(new);
        self.lifecycle.before_save(SaveOp::Create, &mut basket, ctx)?;

        let model = self
            .base
            .insert(baskets::insert_model(&basket))
            .await
            .map_err(internal)?;
        let mut basket = model.into_basket(&self.codec);
        self.lifecycle.after_save(SaveOp::Create, &mut basket, ctx)?;

        tracing::info!(basket_id = %basket.id, lines = basket.lines.len(), "Created basket");
        Ok(basket)
    }

    async fn edit_line(
        &self,
        ctx: &RequestContext,
        id: i64,
        edit: LineEdit,
    ) -> BasketResult<Basket> {
        let txn = self.base.begin().await.map_err(internal)?;
        let mut basket = self.locked(&txn, id).await?;

        edit.apply(&mut basket);
        basket.touch();
        let basket = self.save_in(&txn, basket, ctx).await?;
        txn.commit().await.map_err(internal)?;

        tracing::info!(basket_id = %basket.id, variant = edit.variant(), "Edited basket line");
        Ok(basket)
    }

    async fn merge(&self, ctx: &RequestContext, target: i64, guest: i64) -> BasketResult<Basket> {
        if target == guest {
            return Err(BasketError::Unprocessable(
                "A basket cannot be merged into itself".to_string(),
            ));
        }

        let txn = self.base.begin().await.map_err(internal)?;
        // Lock in id order so two opposite merges cannot deadlock
        let (first, second) = if target < guest {
            (target, guest)
        } else {
            (guest, target)
        };
        let first = self.locked(&txn, first).await?;
        let second = self.locked(&txn, second).await?;
        let (mut into, mut from) = if first.key == target {
            (first, second)
        } else {
            (second, first)
        };

        into.absorb(&from);
        into.touch();
        let into = self.save_in(&txn, into, ctx).await?;

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut from, ctx)?;
        from.merged_key = Some(into.key);
        from.deleted_at = Some(now_utc());
        from.touch();
        let mut from = self.save_in(&txn, from, ctx).await?;
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut from, ctx)?;
        txn.commit().await.map_err(internal)?;

        tracing::info!(basket_id = %into.id, merged = %from.id, "Merged basket");
        Ok(into)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> BasketResult<()> {
        let mut basket = self
            .find(id, Trashed::Without)
            .await?
            .ok_or_else(|| BasketError::NotFound(id.to_string()))?;

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut basket, ctx)?;
        basket.deleted_at = Some(now_utc());
        basket.touch();
        let model = self
            .base
            .update(baskets::ActiveModel::from(&basket))
            .await
            .map_err(internal)?;
        let mut basket = model.into_basket(&self.codec);
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut basket, ctx)?;

        tracing::info!(basket_id = %basket.id, "Deleted basket");
        Ok(())
    }
}

pub struct PgSavedBasketRepository {
    base: SavedBaskets,
    codec: HashIdCodec,
    lifecycle: Lifecycle<SavedBasket>,
}

impl PgSavedBasketRepository {
    pub fn new(db: DatabaseConnection, codec: HashIdCodec) -> Self {
        Self {
            base: BaseRepository::new(db),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }

    async fn live(&self, id: i64) -> BasketResult<SavedBasket> {
        self.find(id)
            .await?
            .ok_or_else(|| BasketError::SavedBasketNotFound(id.to_string()))
    }
}

#[async_trait]
impl SavedBasketRepository for PgSavedBasketRepository {
    fn decode_id(&self, hashed: &str) -> BasketResult<i64> {
        decode_saved(&self.codec, hashed)
    }

    async fn list_for_user(&self, user_id: i64) -> BasketResult<Vec<SavedBasket>> {
        let models = saved_baskets::Entity::find()
            .filter(saved_baskets::Column::UserId.eq(user_id))
            .trashed(saved_baskets::Column::DeletedAt, Trashed::Without)
            .order_by_asc(saved_baskets::Column::Id)
            .all(self.base.db())
            .await
            .map_err(internal)?;

        Ok(models
            .into_iter()
            .map(|m| m.into_saved_basket(&self.codec))
            .collect())
    }

    async fn find(&self, id: i64) -> BasketResult<Option<SavedBasket>> {
        let model = saved_baskets::Entity::find_by_id(id)
            .trashed(saved_baskets::Column::DeletedAt, Trashed::Without)
            .one(self.base.db())
            .await
            .map_err(internal)?;

        Ok(model.map(|m| m.into_saved_basket(&self.codec)))
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        basket_key: i64,
        user_id: i64,
        name: String,
    ) -> BasketResult<SavedBasket> {
        let mut saved = saved_draft(basket_key, user_id, name);
        self.lifecycle.before_save(SaveOp::Create, &mut saved, ctx)?;

        let model = self
            .base
            .insert(saved_baskets::insert_model(&saved))
            .await
            .map_err(internal)?;
        let mut saved = model.into_saved_basket(&self.codec);
        self.lifecycle.after_save(SaveOp::Create, &mut saved, ctx)?;

        tracing::info!(saved_basket_id = %saved.id, basket_id = %saved.basket_id, "Saved basket");
        Ok(saved)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateSavedBasket,
    ) -> BasketResult<SavedBasket> {
        let mut saved = self.live(id).await?;
        if let Some(name) = input.name {
            saved.name = name;
        }
        saved.touch();

        self.lifecycle.before_save(SaveOp::Update, &mut saved, ctx)?;
        let model = self
            .base
            .update(saved_baskets::ActiveModel::from(&saved))
            .await
            .map_err(internal)?;
        let mut saved = model.into_saved_basket(&self.codec);
        self.lifecycle.after_save(SaveOp::Update, &mut saved, ctx)?;

        tracing::info!(saved_basket_id = %saved.id, "Updated saved basket");
        Ok(saved)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> BasketResult<()> {
        let mut saved = self.live(id).await?;

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut saved, ctx)?;
        saved.deleted_at = Some(now_utc());
        saved.touch();
        let model = self
            .base
            .update(saved_baskets::ActiveModel::from(&saved))
            .await
            .map_err(internal)?;
        let mut saved = model.into_saved_basket(&self.codec);
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut saved, ctx)?;

        tracing::info!(saved_basket_id = %saved.id, "Deleted saved basket");
        Ok(())
    }
}
