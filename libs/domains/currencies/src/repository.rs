use async_trait::async_trait;
use core_model::{
    HashIdCodec, Lifecycle, LifecycleEvent, RequestContext, SaveOp, Trashed, now_utc,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CurrencyError, CurrencyResult};
use crate::models::{CreateCurrency, Currency, CurrencyFilter, UpdateCurrency};

/// Persistence of currencies.
///
/// Listing is in insertion order. At most one live currency is the default;
/// `set_default` and creating a default currency clear the previous one in
/// the same write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CurrencyRepository: Send + Sync {
    fn decode_id(&self, hashed: &str) -> CurrencyResult<i64>;

    async fn list(&self, filter: CurrencyFilter) -> CurrencyResult<Vec<Currency>>;

    async fn find(&self, id: i64, trashed: Trashed) -> CurrencyResult<Option<Currency>>;

    /// Live currency with this code
    async fn find_by_code(&self, code: &str) -> CurrencyResult<Option<Currency>>;

    async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateCurrency,
    ) -> CurrencyResult<Currency>;

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateCurrency,
    ) -> CurrencyResult<Currency>;

    async fn delete(&self, ctx: &RequestContext, id: i64) -> CurrencyResult<()>;

    async fn set_default(&self, ctx: &RequestContext, id: i64) -> CurrencyResult<Currency>;
}

pub(crate) fn decode(codec: &HashIdCodec, hashed: &str) -> CurrencyResult<i64> {
    codec
        .decode(hashed)
        .map_err(|_| CurrencyError::NotFound(hashed.to_string()))
}

pub(crate) fn draft(input: CreateCurrency) -> Currency {
    let now = now_utc();
    Currency {
        key: 0,
        id: String::new(),
        code: input.code,
        name: input.name,
        enabled: input.enabled,
        exchange_rate: input.exchange_rate,
        format: input.format,
        decimal_point: input.decimal_point,
        thousand_point: input.thousand_point,
        default: input.default,
        audit: Default::default(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub(crate) fn admits(filter: &CurrencyFilter, currency: &Currency) -> bool {
    filter.trashed.admits(currency.deleted_at.as_ref())
        && filter.enabled.is_none_or(|enabled| currency.enabled == enabled)
}

#[derive(Debug, Default)]
struct Store {
    rows: BTreeMap<i64, Currency>,
    last_id: i64,
}

impl Store {
    fn code_taken(&self, code: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|c| !c.is_trashed() && c.code == code && Some(c.key) != except)
    }

    fn live(&self, id: i64) -> CurrencyResult<&Currency> {
        self.rows
            .get(&id)
            .filter(|c| !c.is_trashed())
            .ok_or_else(|| CurrencyError::NotFound(id.to_string()))
    }

    /// Currencies that lose the default flag when `id` takes it
    fn previous_defaults(&self, id: Option<i64>) -> Vec<Currency> {
        self.rows
            .values()
            .filter(|c| !c.is_trashed() && c.default && Some(c.key) != id)
            .cloned()
            .collect()
    }
}

/// In-memory implementation of CurrencyRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryCurrencyRepository {
    store: Arc<RwLock<Store>>,
    codec: HashIdCodec,
    lifecycle: Lifecycle<Currency>,
}

impl InMemoryCurrencyRepository {
    pub fn new(codec: HashIdCodec) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            codec,
            lifecycle: Lifecycle::audited(),
        }
    }

    /// Repository holding the installation currencies
    pub async fn seeded(codec: HashIdCodec) -> CurrencyResult<Self> {
        let repository = Self::new(codec);
        for currency in CreateCurrency::seed() {
            repository.create(&RequestContext::system(), currency).await?;
        }
        Ok(repository)
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle<Currency>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    fn save(
        &self,
        op: SaveOp,
        currency: &mut Currency,
        ctx: &RequestContext,
    ) -> CurrencyResult<()> {
        self.lifecycle.before_save(op, currency, ctx)?;
        self.lifecycle.after_save(op, currency, ctx)?;
        Ok(())
    }

    fn demote(
        &self,
        store: &Store,
        keep: Option<i64>,
        ctx: &RequestContext,
    ) -> CurrencyResult<Vec<Currency>> {
        let mut demoted = store.previous_defaults(keep);
        for currency in demoted.iter_mut() {
            currency.default = false;
            currency.touch();
            self.save(SaveOp::Update, currency, ctx)?;
        }
        Ok(demoted)
    }
}

#[async_trait]
impl CurrencyRepository for InMemoryCurrencyRepository {
    fn decode_id(&self, hashed: &str) -> CurrencyResult<i64> {
        decode(&self.codec, hashed)
    }

    async fn list(&self, filter: CurrencyFilter) -> CurrencyResult<Vec<Currency>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .filter(|c| admits(&filter, c))
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64, trashed: Trashed) -> CurrencyResult<Option<Currency>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .get(&id)
            .filter(|c| trashed.admits(c.deleted_at.as_ref()))
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> CurrencyResult<Option<Currency>> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .find(|c| !c.is_trashed() && c.code == code)
            .cloned())
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        input: CreateCurrency,
    ) -> CurrencyResult<Currency> {
        let mut store = self.store.write().await;
        if store.code_taken(&input.code, None) {
            return Err(CurrencyError::DuplicateCode(input.code));
        }

        let key = store.last_id + 1;
        let mut currency = draft(input);
        currency.key = key;
        currency.id = self.codec.encode(key);
        self.save(SaveOp::Create, &mut currency, ctx)?;

        let demoted = if currency.default {
            self.demote(&store, Some(key), ctx)?
        } else {
            Vec::new()
        };

        store.last_id = key;
        store.rows.insert(key, currency.clone());
        store.rows.extend(demoted.into_iter().map(|c| (c.key, c)));

        tracing::info!(currency_id = %currency.id, code = %currency.code, "Created currency");
        Ok(currency)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateCurrency,
    ) -> CurrencyResult<Currency> {
        let mut store = self.store.write().await;
        let mut currency = store.live(id)?.clone();

        if let Some(code) = input.code.as_ref() {
            if store.code_taken(code, Some(id)) {
                return Err(CurrencyError::DuplicateCode(code.clone()));
            }
        }

        currency.apply_update(input);
        self.save(SaveOp::Update, &mut currency, ctx)?;
        store.rows.insert(id, currency.clone());

        tracing::info!(currency_id = %currency.id, "Updated currency");
        Ok(currency)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> CurrencyResult<()> {
        let mut store = self.store.write().await;
        let mut currency = store.live(id)?.clone();

        self.lifecycle.fire(LifecycleEvent::Deleting, &mut currency, ctx)?;
        currency.deleted_at = Some(now_utc());
        currency.touch();
        self.lifecycle.fire(LifecycleEvent::Deleted, &mut currency, ctx)?;
        store.rows.insert(id, currency);

        tracing::info!(currency_id = id, "Deleted currency");
        Ok(())
    }

    async fn set_default(&self, ctx: &RequestContext, id: i64) -> CurrencyResult<Currency> {
        let mut store = self.store.write().await;
        let mut currency = store.live(id)?.clone();

        let demoted = self.demote(&store, Some(id), ctx)?;
        if !currency.default {
            currency.default = true;
            currency.touch();
            self.save(SaveOp::Update, &mut currency, ctx)?;
        }

        store.rows.extend(demoted.into_iter().map(|c| (c.key, c)));
        store.rows.insert(id, currency.clone());

        tracing::info!(currency_id = %currency.id, code = %currency.code, "Set default currency");
        Ok(currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> InMemoryCurrencyRepository {
        InMemoryCurrencyRepository::seeded(HashIdCodec::new("test", 8))
            .await
            .unwrap()
    }

    async fn default_codes(repo: &InMemoryCurrencyRepository) -> Vec<String> {
        repo.list(CurrencyFilter::default())
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.default)
            .map(|c| c.code)
            .collect()
    }

    #[tokio::test]
    async fn seeded_currencies_list_in_insertion_order() {
        let repo = repo().await;
        let enabled = repo
            .list(CurrencyFilter {
                enabled: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        let codes: Vec<&str> = enabled.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["GBP", "EUR", "USD"]);
        assert_eq!(enabled[0].format, "&#xa3;{price}");
        assert_eq!(enabled[1].exchange_rate.to_string(), "8.7260");
    }

    #[tokio::test]
    async fn set_default_moves_the_flag() {
        let repo = repo().await;
        let eur = repo.find_by_code("EUR").await.unwrap().unwrap();

        let updated = repo.set_default(&RequestContext::system(), eur.key).await.unwrap();
        assert!(updated.default);
        assert_eq!(default_codes(&repo).await, vec!["EUR"]);

        // idempotent
        repo.set_default(&RequestContext::system(), eur.key).await.unwrap();
        assert_eq!(default_codes(&repo).await, vec!["EUR"]);
    }

    #[tokio::test]
    async fn creating_a_default_demotes_the_previous_one() {
        let repo = repo().await;
        let mut input = CreateCurrency::seed().remove(0);
        input.code = "JPY".to_string();
        input.default = true;

        repo.create(&RequestContext::system().with_user(5), input)
            .await
            .unwrap();
        assert_eq!(default_codes(&repo).await, vec!["JPY"]);

        let gbp = repo.find_by_code("GBP").await.unwrap().unwrap();
        assert_eq!(gbp.audit.updated_by, Some(5));
    }

    #[tokio::test]
    async fn codes_are_unique_among_live_rows() {
        let repo = repo().await;
        let err = repo
            .create(&RequestContext::system(), CreateCurrency::seed().remove(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CurrencyError::DuplicateCode(_)));

        let eur = repo.find_by_code("EUR").await.unwrap().unwrap();
        repo.delete(&RequestContext::system(), eur.key).await.unwrap();
        assert!(repo.find_by_code("EUR").await.unwrap().is_none());
        assert!(repo.find(eur.key, Trashed::Only).await.unwrap().is_some());

        repo.create(&RequestContext::system(), CreateCurrency::seed().remove(1))
            .await
            .unwrap();
    }
}
