//! Codescope CLI: project analysis from the terminal.
//!
//! Usage:
//!   codescope structure [--depth N] [--lines]   # Tree + language stats
//!   codescope deps [--file F]                   # Import graph + cycles
//!   codescope complexity <FILE> [--function F]  # One file or function
//!   codescope report                            # Complexity of everything
//!   codescope smells [--type T]...              # Code smells
//!   codescope stack                             # Tech stack
//!   codescope coverage                          # Test coverage by naming
//!
//! Add `--json` to any command for machine-readable output.

use clap::Parser;
use codescope::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli::run(cli).await {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
