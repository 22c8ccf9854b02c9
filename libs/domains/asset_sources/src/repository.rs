use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, Trashed, now_utc,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AssetSourceError, AssetSourceResult};
use crate::models::{AssetSource, AssetSourceFilter, CreateAssetSource, UpdateAssetSource};

/// Persistence of asset sources.
///
/// Handles are unique among live rows and each disk has at most one live
/// default; writes that set `default` clear it on the other sources of the
/// same disk.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetSourceRepository: Send + Sync {
    fn decode_id(&self, hashed: &str) -> AssetSourceResult<i64>;

    async fn list(&self, filter: AssetSourceFilter) -> AssetSourceResult<Vec<AssetSource>>;

    async fn find(&self, id: i64, trashed: Trashed) -> AssetSourceResult<Option<AssetSource>>;

    async fn find_by_handle(&self, handle: &str) -> AssetSourceResult<Option<AssetSource>>;

    async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateAssetSource,
    ) -> AssetSourceResult<AssetSource>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateAssetSource,
    ) -> AssetSourceResult<AssetSource>;

    /// Set or clear `disabled_at`
    async fn set_disabled(
        &self,
        ctx: &RequestContext,
        id: i64,
        disabled: bool,
    ) -> AssetSourceResult<AssetSource>;

    async fn delete(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<()>;

    /// Un-trash; the default flag is dropped when the disk gained another default
    async fn restore(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<AssetSource>;

    /// Remove the row permanently, trashed or not
    async fn force_delete(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<()>;
}

pub(crate) fn decode(codec: &HashIdCodec, hashed: &str) -> AssetSourceResult<i64> {
    codec
        .decode(hashed)
        .map_err(|_| AssetSourceError::NotFound(hashed.to_string()))
}

pub(crate) fn draft(input: CreateAssetSource) -> AssetSource {
    let now = now_utc();
    AssetSource {
        key: 0,
        id: String::new(),
        name: input.name,
        handle: input.handle,
        disk: input.disk,
        default: input.default,
        bucket: input.bucket,
        path: input.path,
        audit: Default::default(),
        disabled_at: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

#[derive(Debug, Default)]
struct Store {
    rows: BTreeMap<i64, AssetSource>,
    last_id: i64,
}

impl Store {
    fn handle_taken(&self, handle: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|s| !s.is_trashed() && s.handle == handle && Some(s.key) != except)
    }

    fn get(&self, id: i64, trashed: Trashed) -> AssetSourceResult<&AssetSource> {
        self.rows
            .get(&id)
            .filter(|s| trashed.admits(s.deleted_at.as_ref()))
            .ok_or_else(|| AssetSourceError::NotFound(id.to_string()))
    }

    fn other_defaults(&self, disk: &str, except: i64) -> Vec<AssetSource> {
        self.rows
            .values()
            .filter(|s| !s.is_trashed() && s.default && s.disk == disk && s.key != except)
            .cloned()
            .collect()
    }
}

/// In-memory implementation of AssetSourceRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryAssetSourceRepository {
    store: Arc<RwLock<Store>>,
    codec: HashIdCodec,
    lifecycle: Lifecycle<AssetSource>,
}

impl InMemoryAssetSourceRepository {
    pub fn new(codec: HashIdCodec) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<AssetSource>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    fn save(
        &self,
        op: SaveOp,
        source: &mut AssetSource,
        ctx: &RequestContext,
    ) -> AssetSourceResult<()> {
        self.lifecycle.before_save(op, source, ctx)?;
        self.lifecycle.after_save(op, source, ctx)?;
        Ok(())
    }

    /// Persist `source`, clearing the default of its disk siblings when it is the default
    fn commit(
        &self,
        store: &mut Store,
        source: AssetSource,
        ctx: &RequestContext,
    ) -> AssetSourceResult<()> {
        let mut demoted = if source.default && !source.is_trashed() {
            store.other_defaults(&source.disk, source.key)
        } else {
            Vec::new()
        };
        for other in demoted.iter_mut() {
            other.default = false;
            other.touch();
            self.save(SaveOp::Update, other, ctx)?;
        }

        store.rows.extend(demoted.into_iter().map(|s| (s.key, s)));
        store.rows.insert(source.key, source);
        Ok(())
    }
}

#[async_trait]
impl AssetSourceRepository for InMemoryAssetSourceRepository {
    fn decode_id(&self, hashed: &str) -> AssetSourceResult<i64> {
        decode(&self.codec, hashed)
    }

    async fn list(&self, filter: AssetSourceFilter) -> AssetSourceResult<Vec<AssetSource>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .filter(|s| filter.admits(s))
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64, trashed: Trashed) -> AssetSourceResult<Option<AssetSource>> {
        let store = self.store.read().await;
        Ok(store.get(id, trashed).ok().cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> AssetSourceResult<Option<AssetSource>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .find(|s| !s.is_trashed() && s.handle == handle)
            .cloned())
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateAssetSource,
    ) -> AssetSourceResult<AssetSource> {
        let mut store = self.store.write().await;
        if store.handle_taken(&input.handle, None) {
            return Err(AssetSourceError::DuplicateHandle(input.handle));
        }

        let key = store.last_id + 1;
        let mut source = draft(input);
        source.key = key;
        source.id = self.codec.encode(key);
        self.save(SaveOp::Create, &mut source, ctx)?;

        store.last_id = key;
        self.commit(&mut store, source.clone(), ctx)?;

        tracing::info!(asset_source_id = %source.id, handle = %source.handle, "Created asset source");
        Ok(source)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateAssetSource,
    ) -> AssetSourceResult<AssetSource> {
        let mut store = self.store.write().await;
        let mut source = store.get(id, Trashed::Without)?.clone();

        if let Some(handle) = input.handle.as_ref() {
            if store.handle_taken(handle, Some(id)) {
                return Err(AssetSourceError::DuplicateHandle(handle.clone()));
            }
        }

        source.apply_update(input);
        self.save(SaveOp::Update, &mut source, ctx)?;
        self.commit(&mut store, source.clone(), ctx)?;

        tracing::info!(asset_source_id = %source.id, "Updated asset source");
        Ok(source)
    }

    async fn set_disabled(
        &self,
        ctx: &RequestContext,
        id: i64,
        disabled: bool,
    ) -> AssetSourceResult<AssetSource> {
        let mut store = self.store.write().await;
        let mut source = store.get(id, Trashed::Without)?.clone();

        source.disabled_at = disabled.then(now_utc);
        source.touch();
        self.save(SaveOp::Update, &mut source, ctx)?;
        store.rows.insert(id, source.clone());

        tracing::info!(asset_source_id = %source.id, disabled, "Toggled asset source");
        Ok(source)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<()> {
        let mut store = self.store.write().await;
        let mut source = store.get(id, Trashed::Without)?.clone();

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut source, ctx)?;
        source.deleted_at = Some(now_utc());
        source.touch();
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut source, ctx)?;
        store.rows.insert(id, source);

        tracing::info!(asset_source_id = id, "Deleted asset source");
        Ok(())
    }

    async fn restore(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<AssetSource> {
        let mut store = self.store.write().await;
        let mut source = store.get(id, Trashed::Only)?.clone();

        if store.handle_taken(&source.handle, Some(id)) {
            return Err(AssetSourceError::DuplicateHandle(source.handle));
        }
        if source.default && !store.other_defaults(&source.disk, id).is_empty() {
            source.default = false;
        }

        self.lifecycle.fire(LifecycleEvent::Restoring, &mut source, ctx)?;
        source.deleted_at = None;
        source.touch();
        self.save(SaveOp::Update, &mut source, ctx)?;
        self.lifecycle.fire(LifecycleEvent::Restored, &mut source, ctx)?;
        store.rows.insert(id, source.clone());

        tracing::info!(asset_source_id = %source.id, "Restored asset source");
        Ok(source)
    }

    async fn force_delete(&self, ctx: &RequestContext, id: i64) -> AssetSourceResult<()> {
        let mut store = self.store.write().await;
        let mut source = store.get(id, Trashed::With)?.clone();

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut source, ctx)?;
        store.rows.remove(&id);
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut source, ctx)?;

        tracing::info!(asset_source_id = id, "Force deleted asset source");
        Ok(())
    }
}
