use core_config::catalog::CatalogConfig;
use core_model::{Localize, RequestContext, Trashed};
use rust_decimal::Decimal;
use std::sync::Arc;
use validator::Validate;

use crate::error::{CurrencyError, CurrencyResult};
use crate::models::{CreateCurrency, Currency, CurrencyFilter, FormattedPrice, UpdateCurrency};
use crate::repository::CurrencyRepository;

/// Service layer for currency business logic
#[derive(Clone)]
pub struct CurrencyService<R: CurrencyRepository> {
    repository: Arc<R>,
    settings: CatalogConfig,
}

impl<R: CurrencyRepository> CurrencyService<R> {
    pub fn new(repository: R, settings: CatalogConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            settings,
        }
    }

    fn present<T: Localize>(&self, ctx: &RequestContext, value: T) -> T {
        value.localize(&ctx.timezone_or(self.settings.app_timezone))
    }

    async fn live(&self, hashed: &str) -> CurrencyResult<Currency> {
        let key = self.repository.decode_id(hashed)?;
        self.repository
            .find(key, Trashed::Without)
            .await?
            .ok_or_else(|| CurrencyError::NotFound(hashed.to_string()))
    }

    /// Currencies in insertion order
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: CurrencyFilter,
    ) -> CurrencyResult<Vec<Currency>> {
        let currencies = self.repository.list(filter).await?;
        Ok(self.present(ctx, currencies))
    }

    /// Lookup by ISO code, case insensitive
    pub async fn get_by_code(&self, ctx: &RequestContext, code: &str) -> CurrencyResult<Currency> {
        let code = code.to_ascii_uppercase();
        let currency = self
            .repository
            .find_by_code(&code)
            .await?
            .ok_or(CurrencyError::NotFound(code))?;
        Ok(self.present(ctx, currency))
    }

    pub async fn get_by_hashed_id(
        &self,
        ctx: &RequestContext,
        id: &str,
        trashed: Trashed,
    ) -> CurrencyResult<Currency> {
        let key = self.repository.decode_id(id)?;
        let currency = self
            .repository
            .find(key, trashed)
            .await?
            .ok_or_else(|| CurrencyError::NotFound(id.to_string()))?;
        Ok(self.present(ctx, currency))
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateCurrency,
    ) -> CurrencyResult<Currency> {
        input
            .validate()
            .map_err(|e| CurrencyError::Validation(e.to_string()))?;

        if self.repository.find_by_code(&input.code).await?.is_some() {
            return Err(CurrencyError::DuplicateCode(input.code));
        }
        if input.default && !input.enabled {
            return Err(CurrencyError::Unprocessable(
                "A disabled currency cannot be the default".to_string(),
            ));
        }

        let currency = self.repository.create(ctx, input).await?;
        Ok(self.present(ctx, currency))
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        input: UpdateCurrency,
    ) -> CurrencyResult<Currency> {
        input
            .validate()
            .map_err(|e| CurrencyError::Validation(e.to_string()))?;

        let current = self.live(id).await?;
        if let Some(code) = input.code.as_ref() {
            let holder = self.repository.find_by_code(code).await?;
            if holder.is_some_and(|c| c.key != current.key) {
                return Err(CurrencyError::DuplicateCode(code.clone()));
            }
        }
        if current.default && input.enabled == Some(false) {
            return Err(CurrencyError::Unprocessable(
                "The default currency cannot be disabled".to_string(),
            ));
        }

        let currency = self.repository.update(ctx, current.key, input).await?;
        Ok(self.present(ctx, currency))
    }

    /// Soft delete; the default currency is kept
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> CurrencyResult<()> {
        let current = self.live(id).await?;
        if current.default {
            return Err(CurrencyError::DefaultLocked(current.code));
        }
        self.repository.delete(ctx, current.key).await
    }

    /// Make this currency the only default
    pub async fn set_default(&self, ctx: &RequestContext, id: &str) -> CurrencyResult<Currency> {
        let current = self.live(id).await?;
        if !current.enabled {
            return Err(CurrencyError::Unprocessable(
                "A disabled currency cannot be the default".to_string(),
            ));
        }
        let currency = self.repository.set_default(ctx, current.key).await?;
        Ok(self.present(ctx, currency))
    }

    pub async fn format(&self, id: &str, amount: Decimal) -> CurrencyResult<FormattedPrice> {
        let currency = self.live(id).await?;
        Ok(FormattedPrice {
            formatted: currency.format_amount(amount),
            code: currency.code,
            amount,
        })
    }
}
