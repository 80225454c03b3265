//! Test coverage by naming convention.
//!
//! A source file is covered when some test file reduces to the same base
//! name. Nothing is executed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, ScopeError};
use crate::scanner::{relative_path, source_files, IgnoreSet};

/// Directory names whose files are all treated as tests.
const TEST_DIRS: &[&str] = &["__tests__", "tests", "test", "spec"];

const TEST_SUFFIXES: &[&str] = &[".test", ".spec", "_test", "_spec", "Tests", "Test"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,
    pub covered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCoverage {
    pub total: usize,
    pub covered: usize,
    pub percentage: f64,
    pub files: Vec<FileCoverage>,
    pub missing: Vec<String>,
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

/// Strip a test marker from a file stem, if it carries one.
fn strip_test_marker(stem: &str) -> Option<&str> {
    for suffix in TEST_SUFFIXES {
        if let Some(base) = stem.strip_suffix(suffix) {
            if !base.is_empty() {
                return Some(base);
            }
        }
    }
    stem.strip_prefix("test_").filter(|base| !base.is_empty())
}

/// Whether `path` (relative to the project root) names a test file.
pub fn is_test_file(path: &Path) -> bool {
    if strip_test_marker(file_stem(path)).is_some() {
        return true;
    }
    path.parent().is_some_and(|parent| {
        parent
            .components()
            .any(|c| c.as_os_str().to_str().is_some_and(|c| TEST_DIRS.contains(&c)))
    })
}

/// Base name shared by a source file and its tests: `foo.test.js`,
/// `foo_test.go`, `test_foo.py` and `FooTest.java` reduce to `foo`/`Foo`.
pub fn base_name(path: &Path) -> String {
    let stem = file_stem(path);
    strip_test_marker(stem).unwrap_or(stem).to_string()
}

/// Match every source file under `root` against the project's test files.
pub async fn analyze_test_coverage(root: &Path, ignore: &IgnoreSet) -> Result<TestCoverage> {
    if !tokio::fs::try_exists(root).await.unwrap_or(false) {
        return Err(ScopeError::NotFound(root.to_path_buf()));
    }

    let (tests, sources): (Vec<_>, Vec<_>) = source_files(root, ignore)
        .into_iter()
        .map(|path| relative_path(root, &path))
        .partition(|rel| is_test_file(Path::new(rel)));

    // First test file (in path order) per base name.
    let mut tests_by_base: BTreeMap<String, String> = BTreeMap::new();
    for test in tests {
        tests_by_base
            .entry(base_name(Path::new(&test)))
            .or_insert(test);
    }

    let files: Vec<FileCoverage> = sources
        .into_iter()
        .map(|file| {
            let test_file = tests_by_base.get(&base_name(Path::new(&file))).cloned();
            debug!(file = %file, test = ?test_file, "coverage match");
            FileCoverage {
                covered: test_file.is_some(),
                file,
                test_file,
            }
        })
        .collect();

    let total = files.len();
    let covered = files.iter().filter(|f| f.covered).count();
    let missing = files
        .iter()
        .filter(|f| !f.covered)
        .map(|f| f.file.clone())
        .collect();
    let percentage = if total == 0 {
        0.0
    } else {
        (covered as f64 / total as f64 * 10_000.0).round() / 100.0
    };

    info!(total, covered, percentage, "test coverage analyzed");
    Ok(TestCoverage {
        total,
        covered,
        percentage,
        files,
        missing,
    })
}
