//! Search engine seams and their implementations.

mod elastic;
mod memory;

pub use elastic::ElasticSearchEngine;
pub use memory::InMemorySearchEngine;

use async_trait::async_trait;

use crate::error::SearchResult;
use crate::models::{Document, SearchHits, SearchRequest};

/// Read side of a search engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Ranked hits of `request` in `index`. A missing index yields no hits.
    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<SearchHits>;
}

/// Write side of a search engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Create `index` unless it already exists
    async fn ensure_index(&self, index: &str) -> SearchResult<()>;

    /// Upsert documents by id, returning how many were accepted
    async fn index_documents(&self, index: &str, documents: Vec<Document>) -> SearchResult<u64>;

    /// Returns `false` when the document was not indexed
    async fn remove_document(&self, index: &str, id: &str) -> SearchResult<bool>;

    /// Drop every document of `index`, leaving it empty but present
    async fn reset_index(&self, index: &str) -> SearchResult<()>;
}
