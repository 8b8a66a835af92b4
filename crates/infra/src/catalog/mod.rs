//! Product catalog storage (the host's product records).

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use stockdate_core::ProductId;
use stockdate_products::Product;

pub use in_memory::InMemoryProductCatalog;
#[cfg(feature = "postgres")]
pub use postgres::PostgresProductCatalog;

/// Product catalog abstraction.
pub trait ProductCatalog: Send + Sync {
    /// Every product id currently in the catalog.
    fn list_ids(&self) -> Result<Vec<ProductId>, CatalogError>;

    /// Load one product. `None` if it does not exist (or no longer exists).
    fn load(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError>;

    /// Persist a product's current state.
    fn save(&self, product: &Product) -> Result<(), CatalogError>;
}

impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    fn list_ids(&self) -> Result<Vec<ProductId>, CatalogError> {
        (**self).list_ids()
    }

    fn load(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError> {
        (**self).load(product_id)
    }

    fn save(&self, product: &Product) -> Result<(), CatalogError> {
        (**self).save(product)
    }
}

/// Catalog storage error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("storage error: {0}")]
    Storage(String),
}
