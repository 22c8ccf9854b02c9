//! Baskets Domain
//!
//! Shopping baskets with JSON line items, the guest-to-user basket merge and
//! named saved baskets.
//!
//! A basket without an owner is a guest basket and can be reached by anyone
//! holding its hashed id. Owned baskets and every saved basket are only
//! visible to their owner; everyone else gets a 404.
//!
//! ```rust,no_run
//! use core_config::catalog::CatalogConfig;
//! use core_model::HashIdCodec;
//! use domain_baskets::{
//!     handlers, BasketService, InMemoryBasketRepository, InMemorySavedBasketRepository,
//!     SavedBasketService,
//! };
//!
//! let settings = CatalogConfig::default();
//! let codec = HashIdCodec::new(&settings.hashids_salt, settings.hashids_min_length);
//! let baskets = InMemoryBasketRepository::new(codec.clone());
//!
//! let saved = SavedBasketService::new(
//!     InMemorySavedBasketRepository::new(codec),
//!     baskets.clone(),
//!     settings.clone(),
//! );
//! let baskets_router = handlers::baskets_router(BasketService::new(baskets, settings));
//! let saved_router = handlers::saved_baskets_router(saved);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{BasketError, BasketResult};
pub use models::{
    AddLine, Basket, BasketLine, CreateBasket, CreateSavedBasket, LineEdit, MergeBaskets,
    NewBasket, SavedBasket, SetLine, UpdateSavedBasket,
};
pub use postgres::{PgBasketRepository, PgSavedBasketRepository};
pub use repository::{
    BasketRepository, InMemoryBasketRepository, InMemorySavedBasketRepository,
    SavedBasketRepository,
};
pub use service::{BasketService, SavedBasketService};
