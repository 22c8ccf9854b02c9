use core_config::search::SearchConfig;
use core_model::Paginated;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use crate::engine::{ElasticSearchEngine, InMemorySearchEngine, Indexer, SearchClient};
use crate::error::{SearchError, SearchResult};
use crate::models::{
    Document, PRODUCT_FIELDS, ProductDocument, ProductHit, ProductQuery, SearchHits,
    SearchRequest, is_valid_product_id,
};

const PRODUCTS: &str = "products";

/// Entry point to the configured search engine.
///
/// Holds the read and write halves separately so either can be swapped or
/// mocked; the product index is reached through [`SearchAdapter::products`].
#[derive(Clone)]
pub struct SearchAdapter {
    client: Arc<dyn SearchClient>,
    indexer: Arc<dyn Indexer>,
    prefix: String,
}

impl SearchAdapter {
    pub fn new(
        client: Arc<dyn SearchClient>,
        indexer: Arc<dyn Indexer>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            indexer,
            prefix: prefix.into(),
        }
    }

    /// In-process engine, for development and tests
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        let engine = Arc::new(InMemorySearchEngine::new());
        Self::new(engine.clone(), engine, prefix)
    }

    /// Elasticsearch when `SEARCH_URL` is set, the in-process engine otherwise
    pub fn from_config(config: &SearchConfig) -> SearchResult<Self> {
        match config.url.as_deref() {
            Some(url) => {
                let engine = Arc::new(ElasticSearchEngine::new(
                    url,
                    Duration::from_secs(config.timeout_secs),
                )?);
                tracing::info!(url, prefix = %config.index_prefix, "Using Elasticsearch engine");
                Ok(Self::new(engine.clone(), engine, config.index_prefix.clone()))
            }
            None => {
                tracing::warn!("SEARCH_URL not set, using the in-memory search engine");
                Ok(Self::in_memory(config.index_prefix.clone()))
            }
        }
    }

    pub fn client(&self) -> &Arc<dyn SearchClient> {
        &self.client
    }

    pub fn indexer(&self) -> &Arc<dyn Indexer> {
        &self.indexer
    }

    /// Full index name for a logical index
    pub fn index_name(&self, index: &str) -> String {
        if self.prefix.is_empty() {
            index.to_string()
        } else {
            format!("{}_{}", self.prefix, index)
        }
    }

    /// Keyword search over the product index with its default fields
    pub async fn search(&self, keywords: &str) -> SearchResult<SearchHits> {
        let request = SearchRequest::keywords(keywords).with_fields(PRODUCT_FIELDS);
        self.client
            .search(&self.index_name(PRODUCTS), &request)
            .await
    }

    pub fn products(&self) -> ProductType {
        ProductType {
            client: self.client.clone(),
            indexer: self.indexer.clone(),
            index: self.index_name(PRODUCTS),
        }
    }
}

/// Typed access to the product index
#[derive(Clone)]
pub struct ProductType {
    client: Arc<dyn SearchClient>,
    indexer: Arc<dyn Indexer>,
    index: String,
}

impl ProductType {
    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub async fn search(&self, query: &ProductQuery) -> SearchResult<Paginated<ProductHit>> {
        query.validate()?;
        let page = query.page();
        let hits = self.client.search(&self.index, &query.to_request()).await?;

        let products = hits
            .hits
            .into_iter()
            .map(ProductHit::from_hit)
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Paginated::new(products, hits.total, page))
    }

    /// Upsert products, creating the index on first use
    pub async fn index(&self, products: &[ProductDocument]) -> SearchResult<u64> {
        let documents = documents(products)?;
        self.indexer.ensure_index(&self.index).await?;
        let indexed = self.indexer.index_documents(&self.index, documents).await?;

        tracing::info!(index = %self.index, submitted = products.len(), indexed, "Indexed products");
        Ok(indexed)
    }

    /// Remove exactly one product; ids that could never have been indexed are
    /// rejected before the engine is called
    pub async fn remove(&self, id: &str) -> SearchResult<()> {
        if !is_valid_product_id(id) {
            return Err(SearchError::Validation(format!("Invalid product id '{}'", id)));
        }
        if !self.indexer.remove_document(&self.index, id).await? {
            return Err(SearchError::NotFound(id.to_string()));
        }

        tracing::info!(index = %self.index, product_id = id, "Removed product from index");
        Ok(())
    }

    /// Replace the whole index with `products`
    pub async fn reindex(&self, products: &[ProductDocument]) -> SearchResult<u64> {
        let documents = documents(products)?;
        self.indexer.reset_index(&self.index).await?;
        let indexed = self.indexer.index_documents(&self.index, documents).await?;

        tracing::info!(index = %self.index, indexed, "Rebuilt product index");
        Ok(indexed)
    }
}

/// Validates every product before anything reaches the engine
fn documents(products: &[ProductDocument]) -> SearchResult<Vec<Document>> {
    products
        .iter()
        .map(|product| {
            product.validate()?;
            product.to_document()
        })
        .collect()
}
