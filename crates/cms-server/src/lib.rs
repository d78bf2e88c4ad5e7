//! HTTP server for the site CMS.
//!
//! This crate serves the public site using axum:
//! - HTML pages rendered from the content store (`/` and `/{permalink}`)
//! - JSON API endpoints for page contexts and navigation
//! - Uploaded static files from the uploads root
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use cms_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         database_path: PathBuf::from("cms.sqlite3"),
//!         analytics_code: "G-XXXX".to_owned(),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (cms-server)
//!                        │
//!                        ├─► HTML pages ──► Store::page_context ──► template
//!                        │
//!                        ├─► API routes ──► Store (JSON)
//!                        │
//!                        └─► Uploads (tower-http ServeDir)
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;
mod static_files;
mod template;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use cms_store::{Store, UploadPolicy};
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory uploaded static files live under.
    pub uploads_root: PathBuf,
    /// URL path uploads are served under.
    pub uploads_url_path: String,
    /// Extension-to-subdirectory overrides for uploads.
    pub upload_subdirectories: BTreeMap<String, String>,
    /// Analytics tracking code rendered into pages.
    pub analytics_code: String,
    /// Enable verbose output.
    pub verbose: bool,
    /// Application version (for `ETag` computation).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            database_path: PathBuf::from("cms.sqlite3"),
            uploads_root: PathBuf::from("static/cms/uploads"),
            uploads_url_path: "/static/cms/uploads".to_owned(),
            upload_subdirectories: BTreeMap::new(),
            analytics_code: String::new(),
            verbose: false,
            version: String::new(),
        }
    }
}

impl ServerConfig {
    /// Upload placement policy with the configured overrides applied.
    #[must_use]
    pub fn upload_policy(&self) -> UploadPolicy {
        self.upload_subdirectories.iter().fold(
            UploadPolicy::new(self.uploads_root.clone()),
            |policy, (extension, subdirectory)| policy.with_subdirectory(extension, subdirectory),
        )
    }
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&config.database_path, config.upload_policy()).await?;
    tracing::info!(
        database = %config.database_path.display(),
        uploads = %config.uploads_root.display(),
        "Opened content store"
    );

    if config.analytics_code.is_empty() {
        tracing::warn!("Analytics code is empty, tracking snippet disabled");
    }

    let state = Arc::new(AppState {
        store: store.clone(),
        analytics_code: config.analytics_code.clone(),
        verbose: config.verbose,
        version: config.version.clone(),
    });

    let app = app::create_router(state, &config.uploads_url_path);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from CMS config.
///
/// # Arguments
///
/// * `config` - CMS configuration
/// * `version` - Application version
/// * `verbose` - Enable verbose output
#[must_use]
pub fn server_config_from_cms_config(
    config: &cms_config::Config,
    version: String,
    verbose: bool,
) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        database_path: config.database_resolved.path.clone(),
        uploads_root: config.uploads_resolved.root.clone(),
        uploads_url_path: config.uploads_resolved.url_path.clone(),
        upload_subdirectories: config.uploads_resolved.subdirectories.clone(),
        analytics_code: config.analytics.code.clone(),
        verbose,
        version,
    }
}
