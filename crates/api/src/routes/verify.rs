use axum::routing::post;
use axum::Router;

use crate::handlers::verify;
use crate::state::AppState;

/// Mount the verification route.
pub fn router() -> Router<AppState> {
    Router::new().route("/verify-crisis", post(verify::verify_crisis))
}
