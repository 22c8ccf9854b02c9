//! Shared test utilities for the storefront domain crates
//!
//! - `TestDatabase`: PostgreSQL container with the workspace migrations applied
//!   (feature: "postgres")
//! - `TestDataBuilder`: deterministic test data generation (always available)
//! - `assertions`: custom assertion helpers (always available)
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let user_id = builder.user_id();
//!     let slug = builder.slug("category", "main");
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_reorder_roots");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Positive user id derived from the seed
    pub fn user_id(&self) -> i64 {
        (self.seed >> 1) as i64 % 1_000_000_000 + 1
    }

    /// Unique display name, e.g. `test-category-12345-main`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Lowercase, dash separated handle usable as a slug
    pub fn slug(&self, prefix: &str, suffix: &str) -> String {
        format!("{}-{}-{}", prefix, self.seed % 100_000, suffix).to_lowercase()
    }
}

pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert `positions` is `base, base + 1, ...` without gaps
    pub fn assert_dense(positions: &[i32], base: i32, context: &str) {
        let expected: Vec<i32> = (0..positions.len() as i32).map(|i| base + i).collect();
        assert_eq!(positions, expected.as_slice(), "{}: positions not dense", context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.user_id(), builder2.user_id());
        assert_eq!(
            builder1.name("category", "test"),
            builder2.name("category", "test")
        );
    }

    #[test]
    fn user_ids_are_positive() {
        for seed in [0, 1, u64::MAX, 1 << 63] {
            assert!(TestDataBuilder::new(seed).user_id() > 0);
        }
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.name("a", "b"), builder2.name("a", "b"));
    }

    #[test]
    fn dense_assertion_accepts_gap_free_runs() {
        assertions::assert_dense(&[1, 2, 3], 1, "one based");
        assertions::assert_dense(&[], 0, "empty");
    }

    #[test]
    #[should_panic]
    fn dense_assertion_rejects_gaps() {
        assertions::assert_dense(&[0, 2], 0, "gap");
    }
}
