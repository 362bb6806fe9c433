use crate::{AppState, handlers};
use axum::Router;

/// Storefront Router Module
///
/// Every path not claimed by the service routes lands on the page fallback.
/// The gate is layered over the whole router in `create_router`, so by the
/// time a request reaches `render_page` it carries a supported locale and
/// satisfies the session policy for its route.
pub fn storefront_routes() -> Router<AppState> {
    Router::new().fallback(handlers::render_page)
}
