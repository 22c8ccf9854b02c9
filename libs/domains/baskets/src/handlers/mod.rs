//! HTTP routers: `/baskets` and `/saved-baskets`

pub mod baskets;
pub mod saved_baskets;

pub use baskets::router as baskets_router;
pub use saved_baskets::router as saved_baskets_router;
