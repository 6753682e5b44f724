pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Product, ProductPatch, ProductRecord},
};

pub use memory::InMemoryProductRepository;
pub use postgres::{create_pool, run_migrations, PgProductRepository};

/// Storage for product rows
///
/// Implementations own row storage and timestamp assignment. Every method is a
/// single store interaction; callers compose them into lifecycle operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Finds the row with this asin whose status equals `active`.
    ///
    /// When several inactive rows share the asin, the most recently updated wins.
    async fn find(&self, asin: &str, active: bool) -> AppResult<Option<ProductRecord>>;

    /// Inserts a new active row with `created_at = updated_at = now`.
    ///
    /// Fails with `Conflict` if an active row already holds the asin.
    async fn insert(&self, product: &Product) -> AppResult<ProductRecord>;

    /// Overwrites every business field of the active row for `asin`.
    ///
    /// Returns `None` if no active row matched.
    async fn replace(&self, asin: &str, product: &Product) -> AppResult<Option<ProductRecord>>;

    /// Writes only the fields present in `patch` to the active row for `asin`
    /// and returns the row as stored afterwards.
    async fn patch(&self, asin: &str, patch: &ProductPatch) -> AppResult<Option<ProductRecord>>;

    /// Sets the status of the row behind `record` to `active`, returning `false`
    /// if the row was missing or already in that state. Timestamps are left untouched.
    async fn set_status(&self, record: &ProductRecord, active: bool) -> AppResult<bool>;
}
