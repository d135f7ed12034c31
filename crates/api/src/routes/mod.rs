pub mod health;
pub mod verify;

use axum::Router;

use crate::state::AppState;

/// Build the route tree.
///
/// ```text
/// GET  /health          service and store health
/// POST /verify-crisis   fake-report verification for one incident
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(verify::router())
}
