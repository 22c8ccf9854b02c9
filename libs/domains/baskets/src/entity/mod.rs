pub mod baskets;
pub mod saved_baskets;
