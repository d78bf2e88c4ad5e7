//! `cms serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use cms_config::{CliSettings, Config};
use cms_server::{run_server, server_config_from_cms_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover cms.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file (overrides config).
    #[arg(long)]
    database: Option<PathBuf>,

    /// Uploads root directory (overrides config).
    #[arg(long)]
    uploads_root: Option<PathBuf>,

    /// Enable verbose output (request logs and missing-page warnings).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            database: self.database,
            uploads_root: self.uploads_root,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Database: {}",
            config.database_resolved.path.display()
        ));
        output.info(&format!(
            "Uploads: {} (served at {})",
            config.uploads_resolved.root.display(),
            config.uploads_resolved.url_path
        ));
        if config.analytics.code.is_empty() {
            output.warning("Analytics: disabled (no analytics.code in config)");
        } else {
            output.info(&format!("Analytics: {}", config.analytics.code));
        }

        let server_config =
            server_config_from_cms_config(&config, version.to_owned(), self.verbose);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
