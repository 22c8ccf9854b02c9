//! Asset Sources Domain
//!
//! Named storage locations (disk, bucket, path) that uploaded assets are
//! written to. Handles are unique among live sources and each disk has at
//! most one default source.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{AssetSourceError, AssetSourceResult};
pub use models::{AssetSource, AssetSourceFilter, CreateAssetSource, UpdateAssetSource};
pub use postgres::PgAssetSourceRepository;
pub use repository::{AssetSourceRepository, InMemoryAssetSourceRepository};
pub use service::AssetSourceService;
