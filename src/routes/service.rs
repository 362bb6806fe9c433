use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Service Router Module
///
/// Operational endpoints consumed by load balancers and the frontend build.
/// None of them are localized and none require a session.
pub fn service_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // Liveness check. Answers immediately once the listener is up.
        .route("/api/health", get(handlers::health))
        // GET /api/gate/config
        // The active locale list and route policy, without secrets.
        .route("/api/gate/config", get(handlers::get_gate_config))
}
