//! Categories Domain
//!
//! Category trees per storefront channel: nested reads, ordered sibling
//! groups, reorder with cycle detection and guarded soft delete.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, audit events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Hashed id resolution, locale and channel checks
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Channel locked writes (trait + in-memory + Postgres)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │    Tree     │  ← Pure reorder/delete planning and tree assembly
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::catalog::CatalogConfig;
//! use core_model::HashIdCodec;
//! use domain_categories::{handlers, InMemoryCategoryRepository, CategoryService};
//!
//! let settings = CatalogConfig::default();
//! let codec = HashIdCodec::new(&settings.hashids_salt, settings.hashids_min_length);
//! let repository = InMemoryCategoryRepository::new(codec);
//! let service = CategoryService::new(repository, settings);
//!
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod tree;

pub use error::{CategoryError, CategoryResult};
pub use models::{
    Category, CategoryListQuery, CategoryNode, CategoryView, ChildrenStrategy, CreateCategory,
    NestedCategory, ReorderCategories, ReorderStatus, UpdateCategory,
};
pub use postgres::PgCategoryRepository;
pub use repository::{CategoryRepository, InMemoryCategoryRepository};
pub use service::CategoryService;
