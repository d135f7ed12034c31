//! Data access for incident records.
//!
//! The orchestrator only sees [`IncidentStore`]. Two adapters implement it:
//! [`PostgrestIncidentStore`] talks to the hosted store's REST gateway, and
//! [`PgIncidentStore`] queries PostgreSQL directly through a `sqlx` pool.

use sqlx::postgres::PgPoolOptions;

pub mod postgrest;
pub mod repositories;
pub mod store;

pub use postgrest::{PostgrestConfig, PostgrestIncidentStore};
pub use repositories::incident_repo::PgIncidentStore;
pub use store::{IncidentStore, StoreError};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
