use core_config::catalog::CatalogConfig;
use core_model::{Localize, RequestContext, Trashed};
use std::sync::Arc;
use validator::Validate;

use crate::error::{BasketError, BasketResult};
use crate::models::{
    AddLine, Basket, CreateBasket, CreateSavedBasket, LineEdit, MergeBaskets, NewBasket,
    SavedBasket, SetLine, UpdateSavedBasket,
};
use crate::repository::{BasketRepository, SavedBasketRepository};

fn acting_user(ctx: &RequestContext) -> BasketResult<i64> {
    ctx.user_id.ok_or(BasketError::Unauthenticated)
}

fn validate<T: Validate>(input: &T) -> BasketResult<()> {
    input
        .validate()
        .map_err(|e| BasketError::Validation(e.to_string()))
}

/// Service layer for basket business logic
#[derive(Clone)]
pub struct BasketService<R: BasketRepository> {
    repository: Arc<R>,
    settings: CatalogConfig,
}

impl<R: BasketRepository> BasketService<R> {
    pub fn new(repository: R, settings: CatalogConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            settings,
        }
    }

    fn present<T: Localize>(&self, ctx: &RequestContext, value: T) -> T {
        value.localize(&ctx.timezone_or(self.settings.app_timezone))
    }

    /// Live basket the acting user may see; others' baskets look absent
    async fn visible(&self, ctx: &RequestContext, hashed: &str) -> BasketResult<Basket> {
        let key = self.repository.decode_id(hashed)?;
        self.repository
            .find(key, Trashed::Without)
            .await?
            .filter(|b| b.is_visible_to(ctx.user_id))
            .ok_or_else(|| BasketError::NotFound(hashed.to_string()))
    }

    /// New basket owned by the acting user, or a guest basket without one
    pub async fn create(&self, ctx: &RequestContext, input: CreateBasket) -> BasketResult<Basket> {
        validate(&input)?;
        let basket = self
            .repository
            .create(ctx, NewBasket::from_request(ctx.user_id, input))
            .await?;
        Ok(self.present(ctx, basket))
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> BasketResult<Basket> {
        let basket = self.visible(ctx, id).await?;
        Ok(self.present(ctx, basket))
    }

    /// Latest live basket of the acting user
    pub async fn current(&self, ctx: &RequestContext) -> BasketResult<Basket> {
        let user_id = acting_user(ctx)?;
        let basket = self
            .repository
            .find_for_user(user_id)
            .await?
            .ok_or_else(|| BasketError::NotFound(format!("user {}", user_id)))?;
        Ok(self.present(ctx, basket))
    }

    pub async fn add_line(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: AddLine,
    ) -> BasketResult<Basket> {
        validate(&input)?;
        let current = self.visible(ctx, id).await?;
        let basket = self
            .repository
            .edit_line(ctx, current.key, LineEdit::Add(input))
            .await?;
        Ok(self.present(ctx, basket))
    }

    /// Set a line's quantity; zero removes it
    pub async fn set_line(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: SetLine,
    ) -> BasketResult<Basket> {
        validate(&input)?;
        let current = self.visible(ctx, id).await?;
        let basket = self
            .repository
            .edit_line(ctx, current.key, LineEdit::Set(input))
            .await?;
        Ok(self.present(ctx, basket))
    }

    /// Fold a guest basket into the acting user's basket `id`.
    ///
    /// The target must be owned by the acting user. The guest basket must be
    /// unowned (or owned by the same user) and priced in the same currency.
    pub async fn merge(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: MergeBaskets,
    ) -> BasketResult<Basket> {
        validate(&input)?;
        let user_id = acting_user(ctx)?;

        let target = self.visible(ctx, id).await?;
        if target.user_id != Some(user_id) {
            return Err(BasketError::NotFound(id.to_string()));
        }
        let guest = self.visible(ctx, &input.basket_id).await?;
        if guest.key == target.key {
            return Err(BasketError::Unprocessable(
                "A basket cannot be merged into itself".to_string(),
            ));
        }
        if guest.currency != target.currency {
            return Err(BasketError::CurrencyMismatch {
                target: target.currency,
                guest: guest.currency,
            });
        }

        let basket = self.repository.merge(ctx, target.key, guest.key).await?;
        Ok(self.present(ctx, basket))
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> BasketResult<()> {
        let current = self.visible(ctx, id).await?;
        self.repository.delete(ctx, current.key).await
    }
}

/// Service layer for saved baskets; every operation needs an acting user
#[derive(Clone)]
pub struct SavedBasketService<S: SavedBasketRepository, R: BasketRepository> {
    repository: Arc<S>,
    baskets: Arc<R>,
    settings: CatalogConfig,
}

impl<S: SavedBasketRepository, R: BasketRepository> SavedBasketService<S, R> {
    pub fn new(repository: S, baskets: R, settings: CatalogConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            baskets: Arc::new(baskets),
            settings,
        }
    }

    fn present<T: Localize>(&self, ctx: &RequestContext, value: T) -> T {
        value.localize(&ctx.timezone_or(self.settings.app_timezone))
    }

    async fn owned(&self, user_id: i64, hashed: &str) -> BasketResult<SavedBasket> {
        let key = self.repository.decode_id(hashed)?;
        self.repository
            .find(key)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| BasketError::SavedBasketNotFound(hashed.to_string()))
    }

    pub async fn save(
        &self,
        ctx: &RequestContext,
        input: CreateSavedBasket,
    ) -> BasketResult<SavedBasket> {
        validate(&input)?;
        let user_id = acting_user(ctx)?;

        let basket_key = self.baskets.decode_id(&input.basket_id)?;
        let basket = self
            .baskets
            .find(basket_key, Trashed::Without)
            .await?
            .filter(|b| b.user_id == Some(user_id))
            .ok_or_else(|| BasketError::NotFound(input.basket_id.clone()))?;

        let saved = self
            .repository
            .create(ctx, basket.key, user_id, input.name)
            .await?;
        Ok(self.present(ctx, saved))
    }

    pub async fn list(&self, ctx: &RequestContext) -> BasketResult<Vec<SavedBasket>> {
        let user_id = acting_user(ctx)?;
        let saved = self.repository.list_for_user(user_id).await?;
        Ok(self.present(ctx, saved))
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> BasketResult<SavedBasket> {
        let user_id = acting_user(ctx)?;
        let saved = self.owned(user_id, id).await?;
        Ok(self.present(ctx, saved))
    }

    /// Rename; an absent name keeps the current one
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: UpdateSavedBasket,
    ) -> BasketResult<SavedBasket> {
        validate(&input)?;
        let user_id = acting_user(ctx)?;
        let current = self.owned(user_id, id).await?;

        let saved = self.repository.update(ctx, current.key, input).await?;
        Ok(self.present(ctx, saved))
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> BasketResult<()> {
        let user_id = acting_user(ctx)?;
        let current = self.owned(user_id, id).await?;
        self.repository.delete(ctx, current.key).await
    }
}
