//! `cms static replace` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use cms_store::{StaticFile, Store, StoreError};

use super::StoreArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the static replace command.
#[derive(Args)]
pub(crate) struct ReplaceArgs {
    /// Static file id.
    id: i64,

    /// Local file with the new content.
    source: PathBuf,

    /// New declared file name (default: keep the current name).
    #[arg(short, long)]
    name: Option<String>,

    #[command(flatten)]
    store: StoreArgs,
}

impl ReplaceArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let store = self.store.open().await?;

        let file = replace(&store, self.id, &self.source, self.name).await;
        store.close().await;
        let file = file?;

        output.success(&format!(
            "Replaced static file {} ({}) with {}",
            file.id, file.filename, file.file
        ));
        Ok(())
    }
}

/// Bind static file `id` to the content of `source`, renaming it only when
/// `name` is given.
async fn replace(
    store: &Store,
    id: i64,
    source: &Path,
    name: Option<String>,
) -> Result<StaticFile, CliError> {
    let filename = match name {
        Some(name) => name,
        None => {
            store
                .get_static_file(id)
                .await?
                .ok_or(StoreError::NotFound { entity: "static file", id })?
                .filename
        }
    };
    let content = std::fs::read(source)?;
    tracing::info!(id, source = %source.display(), filename = %filename, "Replacing static file");

    Ok(store.replace_static_file(id, &filename, &content).await?)
}
