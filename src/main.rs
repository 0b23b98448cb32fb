//! linkhoard CLI
//!
//! Bookmark import and link status verification.
//! JSON goes to stdout, logs to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use linkhoard::import::{run_import, ImportArgs};
use linkhoard::logging::init_logging;
use linkhoard::status_check::{run_check, CheckArgs};

#[derive(Parser)]
#[command(name = "linkhoard")]
#[command(author = "RoyalBit Inc.")]
#[command(version)]
#[command(about = "Bookmark import and link status verification")]
#[command(long_about = "Imports browser bookmark exports and checks that bookmarked URLs are alive.\n\nCommands:\n  import    Normalize and deduplicate bookmark HTML files\n  check     Probe URLs with HEAD requests")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import Netscape bookmark HTML files as one deduplicated batch
    Import(ImportArgs),
    /// Check URL reachability for a JSON batch, a single URL or stdin
    Check(CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Import(args) => run_import(args).await,
        Commands::Check(args) => run_check(args).await,
    }
}
