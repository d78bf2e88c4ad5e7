//! CMS CLI - Site content management.
//!
//! Provides commands for:
//! - `serve`: Start the site server
//! - `static add|replace|remove|list`: Manage uploaded static files

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ServeArgs, StaticCommand};
use error::CliError;
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CMS - Site content management.
#[derive(Parser)]
#[command(name = "cms", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the site server.
    Serve(ServeArgs),
    /// Uploaded static file commands.
    #[command(subcommand)]
    Static(StaticCommand),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Check if verbose flag is set for serve command
    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| match cli.command {
            Commands::Serve(args) => rt.block_on(args.execute(VERSION)),
            Commands::Static(cmd) => rt.block_on(cmd.execute()),
        });

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_static_add() {
        let cli = Cli::try_parse_from(["cms", "static", "add", "logo.png", "--name", "brand.png"])
            .unwrap();

        assert!(matches!(cli.command, Commands::Static(StaticCommand::Add(_))));
    }

    #[test]
    fn test_parse_serve_verbose() {
        let cli = Cli::try_parse_from(["cms", "serve", "-p", "9000", "-v"]).unwrap();

        assert!(matches!(cli.command, Commands::Serve(ref args) if args.verbose));
    }
}
