//! Dependency graph module.
//!
//! One node per analyzed source file, one edge per import occurrence, and
//! the cycles found by a depth-first search over those edges.

pub mod builder;
pub mod engine;
pub mod resolve;
pub mod types;

pub use builder::{build_dependency_graph, GraphOptions};
pub use engine::ImportGraph;
pub use resolve::resolve_import;
pub use types::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind};
