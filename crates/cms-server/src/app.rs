//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `uploads_url_path` - URL path the uploads root is served under
pub(crate) fn create_router(state: Arc<AppState>, uploads_url_path: &str) -> Router {
    // API routes
    let api_routes = Router::new()
        .route("/api/navigation", get(handlers::navigation::get_navigation))
        .route("/api/pages/", get(handlers::pages::get_root_page_data))
        .route("/api/pages/{permalink}", get(handlers::pages::get_page_data));

    // Rendered pages
    let page_routes = Router::new()
        .route("/", get(handlers::pages::get_home))
        .route("/{permalink}", get(handlers::pages::get_page));

    let uploads_root = state.store.uploads().root().to_path_buf();

    Router::new()
        .merge(api_routes)
        .merge(page_routes)
        .merge(static_files::uploads_router(uploads_url_path, &uploads_root))
        .fallback(handlers::pages::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}
