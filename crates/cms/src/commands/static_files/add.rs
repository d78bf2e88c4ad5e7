//! `cms static add` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use cms_store::{StaticFile, Store};

use super::{StoreArgs, declared_name};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the static add command.
#[derive(Args)]
pub(crate) struct AddArgs {
    /// Local file to upload.
    source: PathBuf,

    /// Declared file name (default: the source's file name).
    #[arg(short, long)]
    name: Option<String>,

    #[command(flatten)]
    store: StoreArgs,
}

impl AddArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let store = self.store.open().await?;

        let file = add(&store, &self.source, self.name).await;
        store.close().await;
        let file = file?;

        output.success(&format!(
            "Added static file {} ({}) as {}",
            file.id, file.filename, file.file
        ));
        Ok(())
    }
}

/// Upload `source` under its declared name.
async fn add(store: &Store, source: &Path, name: Option<String>) -> Result<StaticFile, CliError> {
    let filename = declared_name(source, name)?;
    let content = std::fs::read(source)?;
    tracing::info!(source = %source.display(), filename = %filename, "Adding static file");

    Ok(store.create_static_file(&filename, &content).await?)
}
