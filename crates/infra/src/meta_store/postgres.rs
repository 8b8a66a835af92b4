//! Postgres-backed attribute store (`product_meta` table).

use std::sync::Arc;

use sqlx::{PgPool, Row};

use stockdate_core::ProductId;

use super::{MetaStore, MetaStoreError};
use crate::pg::block_on;

/// Postgres-backed attribute store.
///
/// One row per `(product_id, meta_key)`; writes are upserts so concurrent
/// form saves and sweeps stay last-writer-wins.
#[derive(Debug, Clone)]
pub struct PostgresMetaStore {
    pool: Arc<PgPool>,
}

impl PostgresMetaStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl MetaStore for PostgresMetaStore {
    fn get_meta(&self, product_id: ProductId, key: &str) -> Result<Option<String>, MetaStoreError> {
        let pool = self.pool.clone();
        let row = block_on(async move {
            sqlx::query(
                r#"
                SELECT meta_value
                FROM product_meta
                WHERE product_id = $1 AND meta_key = $2
                "#,
            )
            .bind(product_id.as_uuid())
            .bind(key)
            .fetch_optional(&*pool)
            .await
        })
        .map_err(MetaStoreError::Storage)?;

        row.map(|r| r.try_get::<String, _>("meta_value"))
            .transpose()
            .map_err(|e| MetaStoreError::Storage(e.to_string()))
    }

    fn update_meta(
        &self,
        product_id: ProductId,
        key: &str,
        value: &str,
    ) -> Result<(), MetaStoreError> {
        let pool = self.pool.clone();
        block_on(async move {
            sqlx::query(
                r#"
                INSERT INTO product_meta (product_id, meta_key, meta_value)
                VALUES ($1, $2, $3)
                ON CONFLICT (product_id, meta_key)
                DO UPDATE SET meta_value = EXCLUDED.meta_value, updated_at = NOW()
                "#,
            )
            .bind(product_id.as_uuid())
            .bind(key)
            .bind(value)
            .execute(&*pool)
            .await
        })
        .map(|_| ())
        .map_err(MetaStoreError::Storage)
    }
}
