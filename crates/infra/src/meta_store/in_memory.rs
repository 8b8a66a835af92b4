use std::collections::HashMap;
use std::sync::RwLock;

use stockdate_core::ProductId;

use super::{MetaStore, MetaStoreError};

/// In-memory attribute store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMetaStore {
    inner: RwLock<HashMap<(ProductId, String), String>>,
}

impl InMemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> MetaStoreError {
    MetaStoreError::Storage("meta store lock poisoned".to_string())
}

impl MetaStore for InMemoryMetaStore {
    fn get_meta(&self, product_id: ProductId, key: &str) -> Result<Option<String>, MetaStoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&(product_id, key.to_string())).cloned())
    }

    fn update_meta(
        &self,
        product_id: ProductId,
        key: &str,
        value: &str,
    ) -> Result<(), MetaStoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert((product_id, key.to_string()), value.to_string());
        Ok(())
    }
}
