//! Currencies Domain
//!
//! Store currencies with exchange rates against the base pricing unit and
//! the display template used to render prices. Exactly one live currency
//! may be the default; it cannot be deleted or disabled.
//!
//! ```rust,no_run
//! use core_config::catalog::CatalogConfig;
//! use core_model::HashIdCodec;
//! use domain_currencies::{handlers, CurrencyService, InMemoryCurrencyRepository};
//!
//! # async fn example() {
//! let settings = CatalogConfig::default();
//! let codec = HashIdCodec::new(&settings.hashids_salt, settings.hashids_min_length);
//! let repository = InMemoryCurrencyRepository::seeded(codec).await.unwrap();
//! let router = handlers::router(CurrencyService::new(repository, settings));
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CurrencyError, CurrencyResult};
pub use models::{CreateCurrency, Currency, CurrencyFilter, FormattedPrice, UpdateCurrency};
pub use postgres::PgCurrencyRepository;
pub use repository::{CurrencyRepository, InMemoryCurrencyRepository};
pub use service::CurrencyService;
