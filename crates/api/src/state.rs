use std::sync::Arc;

use resqnet_db::IncidentStore;
use resqnet_gemini::InferenceClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Both collaborators are built once at startup and only read afterwards, so
/// concurrent requests share them without locking. Tests substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Incident lookups.
    pub incidents: Arc<dyn IncidentStore>,
    /// Fake-report classification.
    pub inference: Arc<dyn InferenceClient>,
}
