//! Postgres-backed product catalog (`products` table).

use std::sync::Arc;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use stockdate_core::{AggregateRoot, ProductId};
use stockdate_products::{Product, StockStatus};

use super::{CatalogError, ProductCatalog};
use crate::pg::block_on;

#[derive(Debug, Clone)]
pub struct PostgresProductCatalog {
    pool: Arc<PgPool>,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn storage(e: impl ToString) -> CatalogError {
    CatalogError::Storage(e.to_string())
}

impl ProductCatalog for PostgresProductCatalog {
    fn list_ids(&self) -> Result<Vec<ProductId>, CatalogError> {
        let pool = self.pool.clone();
        let rows = block_on(async move {
            sqlx::query("SELECT product_id FROM products ORDER BY product_id")
                .fetch_all(&*pool)
                .await
        })
        .map_err(CatalogError::Storage)?;

        rows.iter()
            .map(|r| {
                r.try_get::<Uuid, _>("product_id")
                    .map(ProductId::from_uuid)
                    .map_err(storage)
            })
            .collect()
    }

    fn load(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError> {
        let pool = self.pool.clone();
        let row = block_on(async move {
            sqlx::query(
                r#"
                SELECT sku, name, stock_status, version
                FROM products
                WHERE product_id = $1
                "#,
            )
            .bind(product_id.as_uuid())
            .fetch_optional(&*pool)
            .await
        })
        .map_err(CatalogError::Storage)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sku: String = row.try_get("sku").map_err(storage)?;
        let name: String = row.try_get("name").map_err(storage)?;
        let status: String = row.try_get("stock_status").map_err(storage)?;
        let version: i64 = row.try_get("version").map_err(storage)?;
        let stock_status = StockStatus::parse(&status).map_err(storage)?;

        Ok(Some(Product::restore(
            product_id,
            sku,
            name,
            stock_status,
            version.max(0) as u64,
        )))
    }

    fn save(&self, product: &Product) -> Result<(), CatalogError> {
        let pool = self.pool.clone();
        let product_id = *product.id().as_uuid();
        let sku = product.sku().to_string();
        let name = product.name().to_string();
        let status = product.stock_status().as_str();
        let version = product.version() as i64;

        block_on(async move {
            sqlx::query(
                r#"
                INSERT INTO products (product_id, sku, name, stock_status, version)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (product_id)
                DO UPDATE SET
                    sku = EXCLUDED.sku,
                    name = EXCLUDED.name,
                    stock_status = EXCLUDED.stock_status,
                    version = EXCLUDED.version,
                    updated_at = NOW()
                "#,
            )
            .bind(product_id)
            .bind(sku)
            .bind(name)
            .bind(status)
            .bind(version)
            .execute(&*pool)
            .await
        })
        .map(|_| ())
        .map_err(CatalogError::Storage)
    }
}
