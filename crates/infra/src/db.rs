//! Postgres connection and schema bootstrap.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::read_model::StoreError;

const SCHEMA: &str = include_str!("../migrations/0001_indexer.sql");

/// Connect to Postgres and make sure the indexer tables exist.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Create the cursor and projection tables if missing (idempotent).
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
