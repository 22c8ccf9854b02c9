use core_config::catalog::CatalogConfig;
use core_model::{Localize, RequestContext, Trashed};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AssetSourceError, AssetSourceResult};
use crate::models::{AssetSource, AssetSourceFilter, CreateAssetSource, UpdateAssetSource};
use crate::repository::AssetSourceRepository;

/// Service layer for asset source business logic
#[derive(Clone)]
pub struct AssetSourceService<R: AssetSourceRepository> {
    repository: Arc<R>,
    settings: CatalogConfig,
}

impl<R: AssetSourceRepository> AssetSourceService<R> {
    pub fn new(repository: R, settings: CatalogConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            settings,
        }
    }

    fn present<T: Localize>(&self, ctx: &RequestContext, value: T) -> T {
        value.localize(&ctx.timezone_or(self.settings.app_timezone))
    }

    async fn load(&self, hashed: &str, trashed: Trashed) -> AssetSourceResult<AssetSource> {
        let key = self.repository.decode_id(hashed)?;
        self.repository
            .find(key, trashed)
            .await?
            .ok_or_else(|| AssetSourceError::NotFound(hashed.to_string()))
    }

    async fn ensure_handle_free(&self, handle: &str, owner: Option<i64>) -> AssetSourceResult<()> {
        let holder = self.repository.find_by_handle(handle).await?;
        if holder.is_some_and(|s| Some(s.key) != owner) {
            return Err(AssetSourceError::DuplicateHandle(handle.to_string()));
        }
        Ok(())
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: AssetSourceFilter,
    ) -> AssetSourceResult<Vec<AssetSource>> {
        let sources = self.repository.list(filter).await?;
        Ok(self.present(ctx, sources))
    }

    pub async fn get_by_handle(
        &self,
        ctx: &RequestContext,
        handle: &str,
    ) -> AssetSourceResult<AssetSource> {
        let source = self
            .repository
            .find_by_handle(handle)
            .await?
            .ok_or_else(|| AssetSourceError::NotFound(handle.to_string()))?;
        Ok(self.present(ctx, source))
    }

    pub async fn get_by_hashed_id(
        &self,
        ctx: &RequestContext,
        id: &str,
        trashed: Trashed,
    ) -> AssetSourceResult<AssetSource> {
        let source = self.load(id, trashed).await?;
        Ok(self.present(ctx, source))
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateAssetSource,
    ) -> AssetSourceResult<AssetSource> {
        input
            .validate()
            .map_err(|e| AssetSourceError::Validation(e.to_string()))?;
        self.ensure_handle_free(&input.handle, None).await?;

        let source = self.repository.create(ctx, input).await?;
        Ok(self.present(ctx, source))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: UpdateAssetSource,
    ) -> AssetSourceResult<AssetSource> {
        input
            .validate()
            .map_err(|e| AssetSourceError::Validation(e.to_string()))?;

        let current = self.load(id, Trashed::Without).await?;
        if let Some(handle) = input.handle.as_deref() {
            self.ensure_handle_free(handle, Some(current.key)).await?;
        }

        let source = self.repository.update(ctx, current.key, input).await?;
        Ok(self.present(ctx, source))
    }

    pub async fn enable(&self, ctx: &RequestContext, id: &str) -> AssetSourceResult<AssetSource> {
        let current = self.load(id, Trashed::Without).await?;
        let source = self.repository.set_disabled(ctx, current.key, false).await?;
        Ok(self.present(ctx, source))
    }

    pub async fn disable(&self, ctx: &RequestContext, id: &str) -> AssetSourceResult<AssetSource> {
        let current = self.load(id, Trashed::Without).await?;
        let source = self.repository.set_disabled(ctx, current.key, true).await?;
        Ok(self.present(ctx, source))
    }

    /// Soft delete, or a permanent one with `force` (trashed rows included)
    pub async fn delete(&self, ctx: &RequestContext, id: &str, force: bool) -> AssetSourceResult<()> {
        if force {
            let current = self.load(id, Trashed::With).await?;
            return self.repository.force_delete(ctx, current.key).await;
        }
        let current = self.load(id, Trashed::Without).await?;
        self.repository.delete(ctx, current.key).await
    }

    pub async fn restore(&self, ctx: &RequestContext, id: &str) -> AssetSourceResult<AssetSource> {
        let current = self.load(id, Trashed::Only).await?;
        self.ensure_handle_free(&current.handle, Some(current.key))
            .await?;

        let source = self.repository.restore(ctx, current.key).await?;
        Ok(self.present(ctx, source))
    }
}
