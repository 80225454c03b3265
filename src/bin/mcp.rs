//! Codescope MCP server: project analysis for AI agents.
//!
//! Runs a JSON-RPC 2.0 server over STDIO that exposes the analyses
//! through the Model Context Protocol (MCP).
//!
//! Usage:
//!   codescope-mcp [project_root]
//!
//! If no project root is given, uses the current working directory. Tool
//! calls may name another root through their `path` argument.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use codescope::config::ScopeConfig;
use codescope::mcp::{self, ToolContext};
use codescope::parser::ParserRegistry;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // MCP uses stdout for protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let project_root = match std::env::args().nth(1) {
        Some(root) => PathBuf::from(root),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };

    info!(root = %project_root.display(), "codescope MCP server starting");

    // Surface a broken config once at startup; each call reloads it.
    let config_path = ScopeConfig::path_for(&project_root);
    if let Err(e) = ScopeConfig::try_load(&config_path) {
        warn!(error = %e, "config invalid, analyses will use defaults");
    }

    let ctx = ToolContext::new(project_root, Arc::new(ParserRegistry::new()));

    info!("MCP server ready, waiting for JSON-RPC requests on stdin");
    mcp::run(&ctx).await.context("MCP server I/O failed")?;
    Ok(())
}
