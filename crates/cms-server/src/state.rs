//! Application state.
//!
//! Shared state for all request handlers.

use cms_store::Store;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Content store for pages, navigation and blocks.
    pub(crate) store: Store,
    /// Analytics tracking code passed to every page context.
    pub(crate) analytics_code: String,
    /// Enable verbose output (log missing pages).
    pub(crate) verbose: bool,
    /// Application version for `ETag` computation.
    pub(crate) version: String,
}
