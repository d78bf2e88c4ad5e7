//! Uploaded static file serving.
//!
//! Serves the uploads root under the configured URL path, so a stored file
//! `images/logo.png` is reachable at `<url_path>/images/logo.png`.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Create router serving `root` under `url_path`.
pub(crate) fn uploads_router(url_path: &str, root: &Path) -> Router<Arc<AppState>> {
    Router::new().nest_service(url_path, ServeDir::new(root))
}
