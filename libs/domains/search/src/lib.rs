//! Search Domain
//!
//! A thin adapter over a search engine. [`SearchAdapter`] owns a read half
//! ([`SearchClient`]) and a write half ([`Indexer`]) and hands out typed
//! accessors such as [`ProductType`]. Elasticsearch is used when a URL is
//! configured; otherwise documents live in process.
//!
//! Engine outages surface as [`SearchError::Unavailable`], rendered as 503.
//!
//! ```rust,no_run
//! use core_config::search::SearchConfig;
//! use domain_search::{handlers, SearchAdapter};
//!
//! # fn example() -> domain_search::SearchResult<()> {
//! let adapter = SearchAdapter::from_config(&SearchConfig::default())?;
//! let router = handlers::router(adapter);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;

pub use adapter::{ProductType, SearchAdapter};
pub use engine::{ElasticSearchEngine, InMemorySearchEngine, Indexer, SearchClient};
pub use error::{SearchError, SearchResult};
pub use models::{
    Document, Hit, IndexSummary, ProductDocument, ProductHit, ProductQuery, SearchHits,
    SearchRequest, TermFilter,
};
