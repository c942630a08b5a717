//! Web server module for the submission endpoint.
//!
//! `GET /health` answers liveness checks; every other request goes to the
//! form submission endpoint, matching how the site posts to a bare function URL.

pub mod handlers;
pub mod response;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{health, submit, AppState, HealthResponse};
pub use response::{ApiResponse, RATE_LIMIT_REMAINING, SUCCESS_MESSAGE};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(submit))
        .fallback(submit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
