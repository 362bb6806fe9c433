use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Response Schemas (exported to the storefront frontend) ---

/// HealthResponse
///
/// Liveness check body for load balancers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
}

/// GateConfigResponse
///
/// The public half of the gate policy, so the frontend can build locale
/// switchers and hide links it would be redirected away from anyway.
/// The JWT secret never leaves the server; only whether verification is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GateConfigResponse {
    pub supported_locales: Vec<String>,
    pub default_locale: String,
    pub protected_routes: Vec<String>,
    pub auth_routes: Vec<String>,
    pub login_route: String,
    pub session_cookie: String,
    pub verifies_tokens: bool,
}

/// PageContext
///
/// What the gate resolved for a storefront page: the locale, the route
/// after the locale segment, and whether a session cookie was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageContext {
    pub locale: String,
    pub route: String,
    pub authenticated: bool,
}
