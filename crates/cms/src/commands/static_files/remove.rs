//! `cms static remove` command implementation.

use clap::Args;

use super::StoreArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the static remove command.
#[derive(Args)]
pub(crate) struct RemoveArgs {
    /// Static file id.
    id: i64,

    #[command(flatten)]
    store: StoreArgs,
}

impl RemoveArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let store = self.store.open().await?;

        let removed = store.delete_static_file(self.id).await;
        store.close().await;
        removed?;

        output.success(&format!("Removed static file {}", self.id));
        Ok(())
    }
}
