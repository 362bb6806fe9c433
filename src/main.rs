use storefront_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging and serves the gated router.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on an unenforceable routing policy)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup: RUST_LOG wins, otherwise development defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_gate=debug,tower_http=info".into());

    // 3. Log format per environment: pretty locally, JSON for log aggregation.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    let locales: Vec<&str> = config
        .gate
        .locales
        .supported()
        .iter()
        .map(|l| l.code())
        .collect();
    tracing::info!(
        ?locales,
        default_locale = %config.gate.locales.default_locale(),
        session_check = ?config.gate.session_check,
        "Gate policy loaded"
    );
    if !config.gate.session_check.verifies_tokens() {
        tracing::warn!(
            "Session cookies are accepted on presence alone; the storefront API must validate tokens"
        );
    }

    // 4. Router and Server Startup
    let bind_addr = config.bind_addr;
    let app = create_router(AppState::new(config));

    let listener = TcpListener::bind(bind_addr)
        .await
        .expect("FATAL: Failed to bind BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/api/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
