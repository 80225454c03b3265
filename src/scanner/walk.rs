//! Ignore rules and source-file enumeration.
//!
//! The walker respects .gitignore like the rest of the tooling, skips hidden
//! entries and prunes the dependency/output folders in [`IgnoreSet`].

use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::ScopeConfig;
use crate::parser::is_source_file;

/// Dependency and build-output folders that are never analyzed.
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "__pycache__",
    "vendor",
    "venv",
    ".git",
];

/// Entry names pruned from scans. Dot-entries are always pruned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            names: DEFAULT_IGNORES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IgnoreSet {
    /// Default ignores plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        set.names.extend(extra.into_iter().map(Into::into));
        set
    }

    pub fn from_config(config: &ScopeConfig) -> Self {
        Self::with_extra(config.ignore.iter().cloned())
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        name.starts_with('.') || self.names.contains(name)
    }
}

/// All files under `root` with a source extension, sorted by path.
pub fn source_files(root: &Path, ignore: &IgnoreSet) -> Vec<PathBuf> {
    walk_files(root, ignore, is_source_file)
}

/// All files under `root` accepted by `keep`, sorted by path.
pub fn walk_files(root: &Path, ignore: &IgnoreSet, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let filter = ignore.clone();
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            entry
                .file_name()
                .to_str()
                .map_or(true, |name| !filter.is_ignored(name))
        })
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| keep(path))
        .collect();
    files.sort();
    files
}

/// `path` relative to `root`, with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_ignore_set() {
        let ignore = IgnoreSet::with_extra(["generated"]);
        assert!(ignore.is_ignored(".env"));
        assert!(ignore.is_ignored("node_modules"));
        assert!(ignore.is_ignored("generated"));
        assert!(!ignore.is_ignored("src"));
    }

    #[test]
    fn test_source_files_sorted_and_pruned() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("src/b.ts"), "").unwrap();
        fs::write(root.join("src/a.py"), "").unwrap();
        fs::write(root.join("src/nested/c.rs"), "").unwrap();
        fs::write(root.join("src/notes.md"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join(".cache/x.js"), "").unwrap();

        let files: Vec<String> = source_files(root, &IgnoreSet::default())
            .iter()
            .map(|p| relative_path(root, p))
            .collect();
        assert_eq!(files, vec!["src/a.py", "src/b.ts", "src/nested/c.rs"]);
    }
}
