//! Repository for the `incidents` table.
//!
//! Rows are selected as `to_jsonb(...)` so both adapters hand the same JSON
//! object to [`Incident`]'s decoder, whatever columns the table grows.

use async_trait::async_trait;
use resqnet_core::incident::Incident;
use serde_json::Value;
use sqlx::PgPool;

use crate::store::{IncidentStore, StoreError};

/// Primary-key lookup. `id` is compared as text so both UUID and integer
/// keys work with a string identifier.
const FIND_BY_ID: &str = "SELECT to_jsonb(i) FROM incidents i WHERE i.id::text = $1 LIMIT 2";

/// Provides data access for incidents.
pub struct IncidentRepo;

impl IncidentRepo {
    /// Fetch the raw row object for an incident.
    ///
    /// Returns `Ok(None)` when no row matches and
    /// [`StoreError::Ambiguous`] when more than one does.
    pub async fn find_row_by_id(pool: &PgPool, id: &str) -> Result<Option<Value>, StoreError> {
        let mut rows = sqlx::query_scalar::<_, Value>(FIND_BY_ID)
            .bind(id)
            .fetch_all(pool)
            .await?;

        if rows.len() > 1 {
            return Err(StoreError::Ambiguous {
                id: id.to_string(),
                count: rows.len(),
            });
        }
        Ok(rows.pop())
    }
}

/// [`IncidentStore`] backed by a `sqlx` connection pool.
#[derive(Clone)]
pub struct PgIncidentStore {
    pool: PgPool,
}

impl PgIncidentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentStore for PgIncidentStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Incident>, StoreError> {
        let Some(row) = IncidentRepo::find_row_by_id(&self.pool, id).await? else {
            tracing::debug!(crisis_id = %id, "No incident row found");
            return Ok(None);
        };

        tracing::debug!(crisis_id = %id, record = %row, "Fetched incident row");
        Ok(Some(serde_json::from_value(row)?))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
