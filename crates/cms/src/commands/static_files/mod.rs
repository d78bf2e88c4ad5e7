//! `cms static` subcommand group.

mod add;
mod list;
mod remove;
mod replace;

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use cms_config::{CliSettings, Config};
use cms_server::server_config_from_cms_config;
use cms_store::Store;

use add::AddArgs;
use list::ListArgs;
use remove::RemoveArgs;
use replace::ReplaceArgs;

use crate::error::CliError;

/// Static file commands.
#[derive(Subcommand)]
pub(crate) enum StaticCommand {
    /// Upload a local file as a new static file.
    Add(AddArgs),
    /// Replace the file bound to an existing static file.
    Replace(ReplaceArgs),
    /// Delete a static file and its stored file.
    Remove(RemoveArgs),
    /// List static files with their stored paths.
    List(ListArgs),
}

impl StaticCommand {
    /// Execute the static subcommand.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Add(args) => args.execute().await,
            Self::Replace(args) => args.execute().await,
            Self::Remove(args) => args.execute().await,
            Self::List(args) => args.execute().await,
        }
    }
}

/// Options locating the content store, shared by all static commands.
#[derive(Args)]
pub(crate) struct StoreArgs {
    /// Path to configuration file (default: auto-discover cms.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config).
    #[arg(long)]
    database: Option<PathBuf>,

    /// Uploads root directory (overrides config).
    #[arg(long)]
    uploads_root: Option<PathBuf>,
}

impl StoreArgs {
    /// Load configuration and open the content store it names.
    async fn open(&self) -> Result<Store, CliError> {
        let cli_settings = CliSettings {
            database: self.database.clone(),
            uploads_root: self.uploads_root.clone(),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let settings = server_config_from_cms_config(&config, String::new(), false);

        Ok(Store::open(&settings.database_path, settings.upload_policy()).await?)
    }
}

/// Static file name for `source`: `name` if given, else the source's file name.
fn declared_name(source: &Path, name: Option<String>) -> Result<String, CliError> {
    if let Some(name) = name {
        return Ok(name);
    }
    source
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            CliError::Validation(format!(
                "Cannot derive a file name from {}, pass --name",
                source.display()
            ))
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use cms_store::UploadPolicy;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    /// Store backed by a temporary database and uploads root.
    pub(crate) async fn test_store() -> (Store, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadPolicy::new(dir.path().join("uploads"));
        let store = Store::open(dir.path().join("cms.sqlite3"), uploads)
            .await
            .unwrap();
        (store, dir)
    }

    #[test]
    fn test_declared_name_defaults_to_file_name() {
        let name = declared_name(Path::new("/tmp/assets/logo.png"), None).unwrap();

        assert_eq!(name, "logo.png");
    }

    #[test]
    fn test_declared_name_prefers_explicit_name() {
        let name =
            declared_name(Path::new("/tmp/logo.png"), Some("brand/logo.png".to_owned())).unwrap();

        assert_eq!(name, "brand/logo.png");
    }

    #[test]
    fn test_declared_name_without_file_name() {
        let err = declared_name(Path::new("/"), None).unwrap_err();

        assert!(matches!(err, CliError::Validation(ref msg) if msg.contains("--name")));
    }
}
