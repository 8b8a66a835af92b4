//! Glue between the synchronous store traits and async `sqlx`.

use std::future::Future;

/// Run an async database call from synchronous store code.
///
/// Requires a multi-threaded tokio runtime on the current thread (the API
/// server, or a runtime entered by the job runner thread).
pub(crate) fn block_on<F, T>(fut: F) -> Result<T, String>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|e| format!("no tokio runtime available: {e}"))?;
    tokio::task::block_in_place(|| handle.block_on(fut)).map_err(|e| e.to_string())
}

const SCHEMA: &str = include_str!("../migrations/0001_products_and_meta.sql");

/// Connect to Postgres and make sure the catalog tables exist.
pub async fn connect(database_url: &str) -> Result<sqlx::PgPool, sqlx::Error> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    tracing::info!("postgres schema ready");
    Ok(pool)
}
