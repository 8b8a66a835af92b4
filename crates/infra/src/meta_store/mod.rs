//! Per-product attribute storage.
//!
//! The host catalog keeps arbitrary string attributes per product (key/value,
//! keyed by product id). Directives live there under two well-known keys.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use stockdate_core::ProductId;

pub use in_memory::InMemoryMetaStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresMetaStore;

/// Product attribute store abstraction.
pub trait MetaStore: Send + Sync {
    /// Read one attribute. `None` when it was never written.
    fn get_meta(&self, product_id: ProductId, key: &str) -> Result<Option<String>, MetaStoreError>;

    /// Insert or overwrite one attribute (last writer wins).
    fn update_meta(&self, product_id: ProductId, key: &str, value: &str)
    -> Result<(), MetaStoreError>;
}

impl<S> MetaStore for Arc<S>
where
    S: MetaStore + ?Sized,
{
    fn get_meta(&self, product_id: ProductId, key: &str) -> Result<Option<String>, MetaStoreError> {
        (**self).get_meta(product_id, key)
    }

    fn update_meta(
        &self,
        product_id: ProductId,
        key: &str,
        value: &str,
    ) -> Result<(), MetaStoreError> {
        (**self).update_meta(product_id, key, value)
    }
}

/// Attribute store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetaStoreError {
    #[error("storage error: {0}")]
    Storage(String),
}
