//! Filesystem scanner: builds a typed tree of a project directory.
//!
//! The tree walk is depth-capped; size aggregation is a second, uncapped walk
//! that skips unreadable subtrees. Entries are sorted by name so repeated
//! scans of an unchanged directory produce identical results.

pub mod walk;

pub use walk::{relative_path, source_files, walk_files, IgnoreSet, DEFAULT_IGNORES};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tracing::{debug, info, warn};

use crate::config::ScopeConfig;
use crate::error::{Result, ScopeError};
use crate::parser::{language_for_path, UNKNOWN_LANGUAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// One entry of the scanned tree.
///
/// Directories always carry `children`; files never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    pub absolute_path: PathBuf,
    pub kind: FileKind,
    /// Bytes, files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    fn file(name: String, path: PathBuf, size: u64) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);
        let language = language_for_path(&path).to_string();
        Self {
            name,
            absolute_path: path,
            kind: FileKind::File,
            size: Some(size),
            extension,
            language: Some(language),
            children: None,
        }
    }

    fn directory(name: String, path: PathBuf, children: Vec<FileNode>) -> Self {
        Self {
            name,
            absolute_path: path,
            kind: FileKind::Directory,
            size: None,
            extension: None,
            language: None,
            children: Some(children),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Number of file nodes in this subtree, including `self`.
    pub fn file_count(&self) -> usize {
        match &self.children {
            Some(children) => children.iter().map(FileNode::file_count).sum(),
            None => usize::from(self.is_file()),
        }
    }

    /// Iterate over every file node in this subtree.
    pub fn files(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        collect_files(std::slice::from_ref(self), &mut out);
        out
    }
}

/// Per-language share of a project's classified files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStats {
    pub language: String,
    pub files: usize,
    /// Only filled by a scan with line counting enabled.
    pub lines: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStructure {
    pub root_path: PathBuf,
    pub files: Vec<FileNode>,
    pub total_files: usize,
    pub total_size: u64,
    pub languages: Vec<LanguageStats>,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Directory scanner with its ignore rules.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    ignore: IgnoreSet,
    count_lines: bool,
}

impl Scanner {
    pub fn new(ignore: IgnoreSet) -> Self {
        Self {
            ignore,
            count_lines: false,
        }
    }

    pub fn from_config(config: &ScopeConfig) -> Self {
        Self::new(IgnoreSet::from_config(config))
    }

    /// Also count lines per language (a second read of every classified file).
    pub fn with_line_counts(mut self) -> Self {
        self.count_lines = true;
        self
    }

    /// Scan `root` down to `max_depth` (0 = only the root's direct children).
    pub async fn scan(&self, root: &Path, max_depth: usize) -> Result<ProjectStructure> {
        if !tokio::fs::try_exists(root).await.unwrap_or(false) {
            return Err(ScopeError::NotFound(root.to_path_buf()));
        }
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| ScopeError::read(root, e))?;

        let entries = self.list_dir(&root).await?;
        let mut files = Vec::with_capacity(entries.len());
        for (name, path, is_dir) in entries {
            if let Some(node) = self.scan_entry(name, path, is_dir, 1, max_depth).await {
                files.push(node);
            }
        }

        let total_files = files.iter().map(FileNode::file_count).sum();
        let total_size = self.directory_size(&root).await;
        let languages = language_stats(&files, self.count_lines).await;

        info!(
            root = %root.display(),
            total_files,
            total_size,
            languages = languages.len(),
            "scan complete"
        );

        Ok(ProjectStructure {
            root_path: root,
            files,
            total_files,
            total_size,
            languages,
        })
    }

    /// Sorted, unignored entries of `dir` as (name, path, is_dir).
    async fn list_dir(&self, dir: &Path) -> Result<Vec<(String, PathBuf, bool)>> {
        let mut reader = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| ScopeError::read(dir, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| ScopeError::read(dir, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if self.ignore.is_ignored(&name) {
                continue;
            }
            let is_dir = match entry.file_type().await {
                Ok(ft) => ft.is_dir(),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            entries.push((name, entry.path(), is_dir));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn scan_entry<'a>(
        &'a self,
        name: String,
        path: PathBuf,
        is_dir: bool,
        depth: usize,
        max_depth: usize,
    ) -> BoxFuture<'a, Option<FileNode>> {
        Box::pin(async move {
            if !is_dir {
                return match tokio::fs::metadata(&path).await {
                    Ok(meta) => Some(FileNode::file(name, path, meta.len())),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable file");
                        None
                    }
                };
            }

            let mut children = Vec::new();
            if depth <= max_depth {
                match self.list_dir(&path).await {
                    Ok(entries) => {
                        for (child_name, child_path, child_is_dir) in entries {
                            if let Some(node) = self
                                .scan_entry(child_name, child_path, child_is_dir, depth + 1, max_depth)
                                .await
                            {
                                children.push(node);
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "skipping unreadable directory"),
                }
            }
            Some(FileNode::directory(name, path, children))
        })
    }

    /// Recursive byte total of `dir`. Unreadable subtrees count as zero.
    pub fn directory_size<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, u64> {
        Box::pin(async move {
            let entries = match self.list_dir(dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(error = %e, "size walk skipped directory");
                    return 0;
                }
            };
            let mut total = 0;
            for (_, path, is_dir) in entries {
                if is_dir {
                    total += self.directory_size(&path).await;
                } else if let Ok(meta) = tokio::fs::metadata(&path).await {
                    total += meta.len();
                }
            }
            total
        })
    }
}

/// Scan with the default ignore set.
pub async fn scan(root: &Path, max_depth: usize) -> Result<ProjectStructure> {
    Scanner::default().scan(root, max_depth).await
}

fn collect_files<'a>(nodes: &'a [FileNode], out: &mut Vec<&'a FileNode>) {
    for node in nodes {
        match &node.children {
            Some(children) => collect_files(children, out),
            None if node.is_file() => out.push(node),
            None => {}
        }
    }
}

/// Language breakdown of the file nodes in `nodes`. `Unknown` is left out.
async fn language_stats(nodes: &[FileNode], count_lines: bool) -> Vec<LanguageStats> {
    let mut files = Vec::new();
    collect_files(nodes, &mut files);

    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for file in files {
        let Some(language) = file.language.as_deref() else {
            continue;
        };
        if language == UNKNOWN_LANGUAGE {
            continue;
        }
        let lines = if count_lines {
            match tokio::fs::read_to_string(&file.absolute_path).await {
                Ok(content) => content.lines().count(),
                Err(e) => {
                    debug!(path = %file.absolute_path.display(), error = %e, "line count skipped");
                    0
                }
            }
        } else {
            0
        };
        let entry = counts.entry(language.to_string()).or_default();
        entry.0 += 1;
        entry.1 += lines;
    }

    let classified: usize = counts.values().map(|(files, _)| files).sum();
    let mut stats: Vec<LanguageStats> = counts
        .into_iter()
        .map(|(language, (files, lines))| LanguageStats {
            language,
            files,
            lines,
            percentage: round2(files as f64 / classified as f64 * 100.0),
        })
        .collect();
    stats.sort_by(|a, b| b.files.cmp(&a.files).then_with(|| a.language.cmp(&b.language)));
    stats
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fixture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/deep/deeper")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("README.md"), "# hi\n").unwrap();
        fs::write(root.join("Makefile"), "all:\n").unwrap();
        fs::write(root.join("src/index.ts"), "export {};\nconst a = 1;\n").unwrap();
        fs::write(root.join("src/util.ts"), "x\n").unwrap();
        fs::write(root.join("src/deep/main.py"), "print(1)\n").unwrap();
        fs::write(root.join("src/deep/deeper/lib.rs"), "fn f() {}\n").unwrap();
        fs::write(root.join("node_modules/lib/index.js"), "module.exports = 1;\n").unwrap();
        fs::write(root.join(".git/HEAD"), "ref\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_scan_missing_root() {
        let result = scan(Path::new("/definitely/not/here"), 3).await;
        assert!(matches!(result, Err(ScopeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tree_shape_and_counts() {
        let dir = fixture();
        let structure = scan(dir.path(), 5).await.unwrap();

        let names: Vec<&str> = structure.files.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Makefile", "README.md", "src"]);

        let leaves: usize = structure.files.iter().map(|n| n.files().len()).sum();
        assert_eq!(structure.total_files, leaves);
        assert_eq!(structure.total_files, 6);

        for node in &structure.files {
            match node.kind {
                FileKind::Directory => assert!(node.children.is_some()),
                FileKind::File => {
                    assert!(node.children.is_none());
                    assert!(node.size.is_some());
                }
            }
        }

        let makefile = &structure.files[0];
        assert_eq!(makefile.extension, None);
        assert_eq!(makefile.language.as_deref(), Some(UNKNOWN_LANGUAGE));
    }

    #[tokio::test]
    async fn test_depth_cap() {
        let dir = fixture();
        let structure = scan(dir.path(), 0).await.unwrap();

        let src = structure.files.iter().find(|n| n.name == "src").unwrap();
        assert_eq!(src.children.as_ref().map(Vec::len), Some(0));
        assert_eq!(structure.total_files, 2);

        let structure = scan(dir.path(), 1).await.unwrap();
        let src = structure.files.iter().find(|n| n.name == "src").unwrap();
        let deep = src
            .children
            .as_ref()
            .unwrap()
            .iter()
            .find(|n| n.name == "deep")
            .unwrap();
        assert_eq!(deep.children.as_ref().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_total_size_ignores_pruned_dirs() {
        let dir = fixture();
        let structure = scan(dir.path(), 0).await.unwrap();
        // Size walk is not depth-capped but skips node_modules and dot-entries.
        let expected: u64 = ["# hi\n", "all:\n", "export {};\nconst a = 1;\n", "x\n", "print(1)\n", "fn f() {}\n"]
            .iter()
            .map(|s| s.len() as u64)
            .sum();
        assert_eq!(structure.total_size, expected);
    }

    #[tokio::test]
    async fn test_language_stats() {
        let dir = fixture();
        let structure = scan(dir.path(), 5).await.unwrap();

        let langs: Vec<(&str, usize)> = structure
            .languages
            .iter()
            .map(|l| (l.language.as_str(), l.files))
            .collect();
        assert_eq!(
            langs,
            vec![("TypeScript", 2), ("Markdown", 1), ("Python", 1), ("Rust", 1)]
        );
        let total: f64 = structure.languages.iter().map(|l| l.percentage).sum();
        assert!((total - 100.0).abs() < 0.1);
        assert!(structure.languages.iter().all(|l| l.lines == 0));
    }

    #[tokio::test]
    async fn test_line_counts_pass() {
        let dir = fixture();
        let structure = Scanner::default()
            .with_line_counts()
            .scan(dir.path(), 5)
            .await
            .unwrap();
        let ts = structure
            .languages
            .iter()
            .find(|l| l.language == "TypeScript")
            .unwrap();
        assert_eq!(ts.lines, 3);
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let dir = fixture();
        let first = scan(dir.path(), 5).await.unwrap();
        let second = scan(dir.path(), 5).await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
