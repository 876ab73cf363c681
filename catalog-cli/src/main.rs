//! catalog CLI - product catalog HTTP service
//!
//! Entry point for the `catalog` binary:
//! - `serve`: start the persistence gateway and HTTP listener, then serve
//!   `/products` until Ctrl+C or SIGTERM

use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "catalog",
    author,
    version,
    about = "Product catalog HTTP service backed by PostgreSQL"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
}

fn main() -> Result<()> {
    let launched = Instant::now();

    // Load .env before clap reads env-backed flags; a missing file is fine.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug })?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args, launched),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_with_global_debug() {
        let cli = Cli::parse_from(["catalog", "serve", "--in-memory", "--debug"]);
        assert!(cli.debug);
        let Commands::Serve(args) = cli.command;
        assert!(args.in_memory);
    }
}
