use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, Trashed, now_utc,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{BasketError, BasketResult};
use crate::models::{Basket, LineEdit, NewBasket, SavedBasket, UpdateSavedBasket};

/// Persistence of baskets.
///
/// Line edits and merges are applied by the repository so that concurrent
/// requests against the same basket serialize instead of overwriting each
/// other's lines.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BasketRepository: Send + Sync {
    fn decode_id(&self, hashed: &str) -> BasketResult<i64>;

    async fn find(&self, id: i64, trashed: Trashed) -> BasketResult<Option<Basket>>;

    /// Most recently created live basket owned by `user_id`
    async fn find_for_user(&self, user_id: i64) -> BasketResult<Option<Basket>>;

    async fn create(&self, ctx: &RequestContext, new: NewBasket) -> BasketResult<Basket>;

    async fn edit_line(
        &self,
        ctx: &RequestContext,
        id: i64,
        edit: LineEdit,
    ) -> BasketResult<Basket>;

    /// Fold `guest` into `target`, then mark `guest` as merged and trash it
    async fn merge(&self, ctx: &RequestContext, target: i64, guest: i64) -> BasketResult<Basket>;

    async fn delete(&self, ctx: &RequestContext, id: i64) -> BasketResult<()>;
}

/// Persistence of saved baskets
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SavedBasketRepository: Send + Sync {
    fn decode_id(&self, hashed: &str) -> BasketResult<i64>;

    async fn list_for_user(&self, user_id: i64) -> BasketResult<Vec<SavedBasket>>;

    async fn find(&self, id: i64) -> BasketResult<Option<SavedBasket>>;

    async fn create(
        &self,
        ctx: &RequestContext,
        basket_key: i64,
        user_id: i64,
        name: String,
    ) -> BasketResult<SavedBasket>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateSavedBasket,
    ) -> BasketResult<SavedBasket>;

    async fn delete(&self, ctx: &RequestContext, id: i64) -> BasketResult<()>;
}

pub(crate) fn decode_basket(codec: &HashIdCodec, hashed: &str) -> BasketResult<i64> {
    codec
        .decode(hashed)
        .map_err(|_| BasketError::NotFound(hashed.to_string()))
}

pub(crate) fn decode_saved(codec: &HashIdCodec, hashed: &str) -> BasketResult<i64> {
    codec
        .decode(hashed)
        .map_err(|_| BasketError::SavedBasketNotFound(hashed.to_string()))
}

pub(crate) fn saved_draft(basket_key: i64, user_id: i64, name: String) -> SavedBasket {
    let now = now_utc();
    SavedBasket {
        key: 0,
        id: String::new(),
        basket_key,
        basket_id: String::new(),
        name,
        user_id,
        audit: Default::default(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn live<'a>(rows: &'a BTreeMap<i64, Basket>, id: i64) -> BasketResult<&'a Basket> {
    rows.get(&id)
        .filter(|b| !b.is_trashed())
        .ok_or_else(|| BasketError::NotFound(id.to_string()))
}

#[derive(Debug, Default)]
struct BasketStore {
    rows: BTreeMap<i64, Basket>,
    last_id: i64,
}

/// In-memory implementation of BasketRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryBasketRepository {
    store: Arc<RwLock<BasketStore>>,
    codec: HashIdCodec,
    lifecycle: Lifecycle<Basket>,
}

impl InMemoryBasketRepository {
    pub fn new(codec: HashIdCodec) -> Self {
        Self {
            store: Arc::new(RwLock::new(BasketStore::default())),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<Basket>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    fn save(&self, op: SaveOp, basket: &mut Basket, ctx: &RequestContext) -> BasketResult<()> {
        self.lifecycle.before_save(op, basket, ctx)?;
        self.lifecycle.after_save(op, basket, ctx)?;
        Ok(())
    }
}

#[async_trait]
impl BasketRepository for InMemoryBasketRepository {
    fn decode_id(&self, hashed: &str) -> BasketResult<i64> {
        decode_basket(&self.codec, hashed)
    }

    async fn find(&self, id: i64, trashed: Trashed) -> BasketResult<Option<Basket>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .get(&id)
            .filter(|b| trashed.admits(b.deleted_at.as_ref()))
            .cloned())
    }

    async fn find_for_user(&self, user_id: i64) -> BasketResult<Option<Basket>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .rev()
            .find(|b| !b.is_trashed() && b.user_id == Some(user_id))
            .cloned())
    }

    async fn create(&self, ctx: &RequestContext, new: NewBasket) -> BasketResult<Basket> {
        let mut store = self.store.write().await;
        let key = store.last_id + 1;

        let mut basket = Basket::from(new);
        basket.key = key;
        basket.id = self.codec.encode(key);
        self.save(SaveOp::Create, &mut basket, ctx)?;

        store.last_id = key;
        store.rows.insert(key, basket.clone());

        tracing::info!(basket_id = %basket.id, lines = basket.lines.len(), "Created basket");
        Ok(basket)
    }

    async fn edit_line(
        &self,
        ctx: &RequestContext,
        id: i64,
        edit: LineEdit,
    ) -> BasketResult<Basket> {
        let mut store = self.store.write().await;
        let mut basket = live(&store.rows, id)?.clone();

        edit.apply(&mut basket);
        basket.touch();
        self.save(SaveOp::Update, &mut basket, ctx)?;
        store.rows.insert(id, basket.clone());

        tracing::info!(basket_id = %basket.id, variant = edit.variant(), "Edited basket line");
        Ok(basket)
    }

    async fn merge(&self, ctx: &RequestContext, target: i64, guest: i64) -> BasketResult<Basket> {
        if target == guest {
            return Err(BasketError::Unprocessable(
                "A basket cannot be merged into itself".to_string(),
            ));
        }
        let mut store = self.store.write().await;
        let mut into = live(&store.rows, target)?.clone();
        let mut from = live(&store.rows, guest)?.clone();

        into.absorb(&from);
        into.touch();
        self.save(SaveOp::Update, &mut into, ctx)?;

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut from, ctx)?;
        from.merged_key = Some(into.key);
        from.merged_id = Some(into.id.clone());
        from.deleted_at = Some(now_utc());
        from.touch();
        self.save(SaveOp::Update, &mut from, ctx)?;
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut from, ctx)?;

        store.rows.insert(guest, from);
        store.rows.insert(target, into.clone());

        tracing::info!(basket_id = %into.id, merged = guest, "Merged basket");
        Ok(into)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> BasketResult<()> {
        let mut store = self.store.write().await;
        let mut basket = live(&store.rows, id)?.clone();

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut basket, ctx)?;
        basket.deleted_at = Some(now_utc());
        basket.touch();
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut basket, ctx)?;
        store.rows.insert(id, basket);

        tracing::info!(basket_id = id, "Deleted basket");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SavedStore {
    rows: BTreeMap<i64, SavedBasket>,
    last_id: i64,
}

impl SavedStore {
    fn live(&self, id: i64) -> BasketResult<&SavedBasket> {
        self.rows
            .get(&id)
            .filter(|s| s.deleted_at.is_none())
            .ok_or_else(|| BasketError::SavedBasketNotFound(id.to_string()))
    }
}

/// In-memory implementation of SavedBasketRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemorySavedBasketRepository {
    store: Arc<RwLock<SavedStore>>,
    codec: HashIdCodec,
    lifecycle: Lifecycle<SavedBasket>,
}

impl InMemorySavedBasketRepository {
    pub fn new(codec: HashIdCodec) -> Self {
        Self {
            store: Arc::new(RwLock::new(SavedStore::default())),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }
}

#[async_trait]
impl SavedBasketRepository for InMemorySavedBasketRepository {
    fn decode_id(&self, hashed: &str) -> BasketResult<i64> {
        decode_saved(&self.codec, hashed)
    }

    async fn list_for_user(&self, user_id: i64) -> BasketResult<Vec<SavedBasket>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .filter(|s| s.deleted_at.is_none() && s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> BasketResult<Option<SavedBasket>> {
        let store = self.store.read().await;
        Ok(store.live(id).ok().cloned())
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        basket_key: i64,
        user_id: i64,
        name: String,
    ) -> BasketResult<SavedBasket> {
        let mut store = self.store.write().await;
        let key = store.last_id + 1;

        let mut saved = saved_draft(basket_key, user_id, name);
        saved.key = key;
        saved.id = self.codec.encode(key);
        saved.basket_id = self.codec.encode(basket_key);
        self.lifecycle.before_save(SaveOp::Create, &mut saved, ctx)?;
        self.lifecycle.after_save(SaveOp::Create, &mut saved, ctx)?;

        store.last_id = key;
        store.rows.insert(key, saved.clone());

        tracing::info!(saved_basket_id = %saved.id, basket_id = %saved.basket_id, "Saved basket");
        Ok(saved)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateSavedBasket,
    ) -> BasketResult<SavedBasket> {
        let mut store = self.store.write().await;
        let mut saved = store.live(id)?.clone();

        if let Some(name) = input.name {
            saved.name = name;
        }
        saved.touch();
        self.lifecycle.before_save(SaveOp::Update, &mut saved, ctx)?;
        self.lifecycle.after_save(SaveOp::Update, &mut saved, ctx)?;
        store.rows.insert(id, saved.clone());

        tracing::info!(saved_basket_id = %saved.id, "Updated saved basket");
        Ok(saved)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> BasketResult<()> {
        let mut store = self.store.write().await;
        let mut saved = store.live(id)?.clone();

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut saved, ctx)?;
        saved.deleted_at = Some(now_utc());
        saved.touch();
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut saved, ctx)?;
        store.rows.insert(id, saved);

        tracing::info!(saved_basket_id = id, "Deleted saved basket");
        Ok(())
    }
}
