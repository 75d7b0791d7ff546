//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Fetch package archives through a bounded download queue.
#[derive(Parser, Debug)]
#[command(name = "pkgshelf")]
#[command(about = "Fetch package archives through a bounded download queue")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
