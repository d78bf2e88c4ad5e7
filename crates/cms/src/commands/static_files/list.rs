//! `cms static list` command implementation.

use clap::Args;

use super::StoreArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the static list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    store: StoreArgs,
}

impl ListArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let store = self.store.open().await?;

        let files = store.list_static_files().await;
        store.close().await;
        let files = files?;

        if files.is_empty() {
            output.info("No static files");
            return Ok(());
        }

        output.heading(&format!("{:>6}  {:<40} {}", "ID", "NAME", "STORED AT"));
        for file in &files {
            output.row(file.id, &file.filename, &file.file);
        }
        Ok(())
    }
}
