//! MCP (Model Context Protocol) server module.
//!
//! Exposes the project analyses as tools over a JSON-RPC 2.0 STDIO
//! interface for AI agents.

pub mod server;
pub mod tools;
pub mod types;

pub use server::{run, serve};
pub use tools::{call_tool, list_tools, ToolContext};
