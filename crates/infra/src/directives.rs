//! Scheduled-stock directives persisted as product attributes.

use stockdate_core::ProductId;
use stockdate_products::{StockDirective, TargetDate};

use crate::meta_store::{MetaStore, MetaStoreError};

/// Attribute holding the target date (`YYYY-MM-DD` or empty).
pub const DATE_META_KEY: &str = "_custom_stock_management_date";

/// Attribute holding the enabled flag (`"0"` or `"1"`).
pub const ENABLED_META_KEY: &str = "_custom_stock_management_auto_out_of_stock";

/// Reads and writes directives through a [`MetaStore`].
#[derive(Debug, Clone)]
pub struct DirectiveRepository<M> {
    meta: M,
}

impl<M: MetaStore> DirectiveRepository<M> {
    pub fn new(meta: M) -> Self {
        Self { meta }
    }

    /// Current directive for a product; defaults when never saved.
    pub fn read(&self, product_id: ProductId) -> Result<StockDirective, MetaStoreError> {
        let target_date = self
            .meta
            .get_meta(product_id, DATE_META_KEY)?
            .and_then(TargetDate::new);
        let enabled = self
            .meta
            .get_meta(product_id, ENABLED_META_KEY)?
            .as_deref()
            .is_some_and(decode_flag);

        Ok(StockDirective::new(target_date, enabled))
    }

    /// Overwrite both attributes.
    pub fn write(
        &self,
        product_id: ProductId,
        directive: &StockDirective,
    ) -> Result<(), MetaStoreError> {
        let flag = if directive.enabled { "1" } else { "0" };
        self.meta.update_meta(product_id, ENABLED_META_KEY, flag)?;

        let date = directive
            .target_date
            .as_ref()
            .map(TargetDate::as_str)
            .unwrap_or("");
        self.meta.update_meta(product_id, DATE_META_KEY, date)
    }
}

/// Only `"1"` counts as enabled.
fn decode_flag(raw: &str) -> bool {
    raw.trim() == "1"
}
