//! Core types for the dependency graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an edge in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// File imports a module identifier.
    Import,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Import => write!(f, "import"),
        }
    }
}

/// One analyzed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// File name (basename).
    pub name: String,
    /// Project-relative path, `/`-separated. This is the node key.
    pub path: String,
    /// Raw import identifiers in source order, duplicates kept.
    pub imports: Vec<String>,
    /// Same list as `imports`.
    pub dependencies: Vec<String>,
    /// Never populated; export extraction is not performed.
    pub exports: Vec<String>,
}

impl DependencyNode {
    pub fn new(path: String, imports: Vec<String>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            name,
            path,
            dependencies: imports.clone(),
            imports,
            exports: Vec::new(),
        }
    }
}

/// A file-to-import relation. `to` is the raw, unresolved identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// Node key `to` refers to, when import resolution is enabled and succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
}

impl DependencyEdge {
    pub fn import(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Import,
            resolved: None,
        }
    }

    /// The identifier cycle detection follows for this edge.
    pub fn target(&self) -> &str {
        self.resolved.as_deref().unwrap_or(&self.to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: Vec<DependencyNode>,
    pub edges: Vec<DependencyEdge>,
    /// Each cycle is a closed walk: first and last entries are equal.
    pub circular: Vec<Vec<String>>,
}

impl DependencyGraph {
    pub fn node(&self, path: &str) -> Option<&DependencyNode> {
        self.nodes.iter().find(|n| n.path == path)
    }

    pub fn has_cycles(&self) -> bool {
        !self.circular.is_empty()
    }
}
