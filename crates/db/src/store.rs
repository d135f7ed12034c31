use async_trait::async_trait;
use resqnet_core::incident::Incident;

/// Name of the table holding crisis reports.
pub const INCIDENTS_TABLE: &str = "incidents";

/// Failures talking to the data store. None of these are recovered by the
/// orchestrator; they surface as a generic server fault.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The REST gateway returned a non-2xx status code.
    #[error("Data store API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The row could not be decoded into an [`Incident`].
    #[error("Malformed incident row: {0}")]
    Decode(#[from] serde_json::Error),

    /// A primary-key lookup matched more than one row.
    #[error("Expected at most one incident for id {id}, got {count}")]
    Ambiguous { id: String, count: usize },
}

/// Single-row lookup against the `incidents` table.
///
/// Implementations are shared across concurrent requests and must not hold
/// per-request state.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Fetch one incident by primary key. `Ok(None)` when no row matches.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Incident>, StoreError>;

    /// Confirm the store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}
