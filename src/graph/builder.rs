//! Graph builder: extracts imports from project files and assembles the
//! dependency graph with its cycles.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::engine::ImportGraph;
use super::resolve::resolve_import;
use super::types::{DependencyEdge, DependencyGraph, DependencyNode};
use crate::config::ScopeConfig;
use crate::error::{Result, ScopeError};
use crate::parser::{read_source, SourceExtractor};
use crate::scanner::{relative_path, source_files, IgnoreSet};

/// Knobs for graph construction.
#[derive(Debug, Clone, Default)]
pub struct GraphOptions {
    pub ignore: IgnoreSet,
    /// Resolve import identifiers to node keys before cycle detection.
    pub resolve_imports: bool,
}

impl GraphOptions {
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self {
            ignore: IgnoreSet::from_config(config),
            resolve_imports: config.resolve_imports,
        }
    }
}

/// Build the dependency graph for `root`, or for the single `file` if given.
///
/// Unreadable files are skipped. Node keys are project-relative paths;
/// edge targets are the raw import strings.
pub async fn build_dependency_graph(
    root: &Path,
    file: Option<&Path>,
    extractor: &SourceExtractor,
    options: &GraphOptions,
) -> Result<DependencyGraph> {
    let root = canonical(root).await?;
    let files = match file {
        Some(file) => vec![resolve_file(&root, file).await?],
        None => source_files(&root, &options.ignore),
    };
    debug!(root = %root.display(), files = files.len(), mode = extractor.mode(), "building dependency graph");

    let mut nodes = Vec::with_capacity(files.len());
    let mut edges = Vec::new();

    for path in &files {
        let source = match read_source(path).await {
            Ok(source) => source,
            Err(e) if e.is_per_file() => {
                warn!(error = %e, "skipping file");
                continue;
            }
            Err(e) => return Err(e),
        };
        let key = relative_path(&root, path);
        let imports = extractor.imports(path, &source);

        for import in &imports {
            edges.push(DependencyEdge::import(key.clone(), import.clone()));
        }
        nodes.push(DependencyNode::new(key, imports));
    }

    if options.resolve_imports {
        let keys: HashSet<String> = nodes.iter().map(|n| n.path.clone()).collect();
        for edge in &mut edges {
            edge.resolved = resolve_import(&edge.from, &edge.to, &keys);
        }
    }

    let graph = ImportGraph::from_edges(nodes.iter().map(|n| n.path.as_str()), &edges);
    let circular = graph.find_cycles();

    info!(
        nodes = nodes.len(),
        edges = edges.len(),
        cycles = circular.len(),
        "dependency graph built"
    );

    Ok(DependencyGraph {
        nodes,
        edges,
        circular,
    })
}

async fn canonical(path: &Path) -> Result<PathBuf> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ScopeError::NotFound(path.to_path_buf()));
    }
    tokio::fs::canonicalize(path)
        .await
        .map_err(|e| ScopeError::read(path, e))
}

/// A file argument may be absolute, relative to the cwd, or relative to the root.
async fn resolve_file(root: &Path, file: &Path) -> Result<PathBuf> {
    if file.is_relative() {
        let under_root = root.join(file);
        if tokio::fs::try_exists(&under_root).await.unwrap_or(false) {
            return canonical(&under_root).await;
        }
    }
    canonical(file).await
}
