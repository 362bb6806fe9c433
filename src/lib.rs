use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// The locale & auth gate and the pieces it is built from.
pub mod auth;
pub mod config;
pub mod gate;
pub mod locale;

// HTTP surface around the gate.
pub mod handlers;
pub mod models;
pub mod routes;
use routes::{service, storefront};

// --- Public Re-exports ---

pub use config::{AppConfig, ConfigError, GateConfig};
pub use gate::{Gate, GateDecision, LocalizedPath, RedirectReason, RouteClass};
pub use locale::{Locale, LocaleSet};

/// ApiDoc
///
/// OpenAPI document for the service routes and the page fallback, served at
/// `/api/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::get_gate_config, handlers::render_page),
    components(
        schemas(
            models::HealthResponse, models::GateConfigResponse, models::PageContext,
        )
    ),
    tags(
        (name = "storefront-gate", description = "Locale & auth gate for the storefront")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state for every request: the gate built from the
/// loaded gate policy.
#[derive(Clone)]
pub struct AppState {
    pub gate: Gate,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            gate: Gate::new(config.gate),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for Gate {
    fn from_ref(app_state: &AppState) -> Gate {
        app_state.gate.clone()
    }
}

/// create_router
///
/// Assembles the routes, puts the locale & auth gate in front of them and
/// adds the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/api/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(service::service_routes())
        .merge(storefront::storefront_routes())
        // The gate wraps every route; its bypass prefixes keep `/api` out.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::locale_auth_gate,
        ))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation.
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                // 3b. Request Tracing, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (outermost)
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer` carrying method, URI and the `x-request-id`, so all
/// log lines of one request, gate redirects included, correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
