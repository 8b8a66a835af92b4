use std::collections::BTreeMap;
use std::sync::RwLock;

use stockdate_core::{AggregateRoot, ProductId};
use stockdate_products::Product;

use super::{CatalogError, ProductCatalog};

/// In-memory catalog for tests/dev.
///
/// Ids are UUIDv7, so iteration order is creation order.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    inner: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a product (host-side deletion).
    pub fn remove(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&product_id))
    }
}

fn poisoned() -> CatalogError {
    CatalogError::Storage("catalog lock poisoned".to_string())
}

impl ProductCatalog for InMemoryProductCatalog {
    fn list_ids(&self) -> Result<Vec<ProductId>, CatalogError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.keys().copied().collect())
    }

    fn load(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&product_id).cloned())
    }

    fn save(&self, product: &Product) -> Result<(), CatalogError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(*product.id(), product.clone());
        Ok(())
    }
}
