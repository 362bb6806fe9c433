use axum::{Json, extract::State};

use crate::{
    auth::SessionStatus,
    gate::{Gate, LocalizedPath},
    models::{GateConfigResponse, HealthResponse, PageContext},
};

/// health
///
/// [Service Route] Returns "ok" as soon as the server is accepting requests.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// get_gate_config
///
/// [Service Route] Publishes the locale list and route policy the gate is
/// running with.
#[utoipa::path(
    get,
    path = "/api/gate/config",
    responses((status = 200, description = "Active gate policy", body = GateConfigResponse))
)]
pub async fn get_gate_config(State(gate): State<Gate>) -> Json<GateConfigResponse> {
    let config = gate.config();
    Json(GateConfigResponse {
        supported_locales: config
            .locales
            .supported()
            .iter()
            .map(|l| l.code().to_string())
            .collect(),
        default_locale: config.locales.default_locale().code().to_string(),
        protected_routes: config.protected_routes.clone(),
        auth_routes: config.auth_routes.clone(),
        login_route: config.login_route.clone(),
        session_cookie: config.session_cookie.clone(),
        verifies_tokens: config.session_check.verifies_tokens(),
    })
}

/// render_page
///
/// [Storefront Route] Fallback for every localized page. Page rendering
/// lives in the frontend; this reports the context the gate resolved.
///
/// Paths the gate bypassed carry no `LocalizedPath` and answer 404.
#[utoipa::path(
    get,
    path = "/{locale}/{route}",
    params(
        ("locale" = String, Path, description = "Supported locale code"),
        ("route" = String, Path, description = "Storefront route after the locale")
    ),
    responses(
        (status = 200, description = "Resolved page context", body = PageContext),
        (status = 307, description = "Redirected by the locale & auth gate"),
        (status = 404, description = "Not a storefront page")
    )
)]
pub async fn render_page(localized: LocalizedPath, session: SessionStatus) -> Json<PageContext> {
    Json(PageContext {
        locale: localized.locale.code().to_string(),
        route: localized.route,
        authenticated: session.is_authenticated(),
    })
}
