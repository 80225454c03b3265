//! Approximate cyclomatic complexity.
//!
//! Score = 1 + one per occurrence of a decision token on any line in range.
//! Tokens are matched in raw text, so occurrences inside strings and
//! comments count too. Function ranges are line heuristics, not brace
//! matching:
//! - structured mode: from the declaration line to the next line that
//!   starts (unindented) with a declaration keyword;
//! - fallback mode: from the first line containing `function <name>`,
//!   `<name>(` or `const <name> =` to the first line, at least three lines
//!   later, that is just `}`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::error::{Result, ScopeError};
use crate::parser::{read_source, SourceExtractor};
use crate::scanner::{relative_path, source_files, IgnoreSet};

/// Decision tokens, counted as plain substrings: `for` inside `format`
/// counts, and `??` also counts as two `?`.
const DECISION_TOKENS: &[&str] = &[
    "if", "else", "while", "for", "switch", "case", "catch", "&&", "||", "?", "??",
];

/// An unindented line opening a new top-level declaration.
static TOP_LEVEL_DECL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(export\s+)?(default\s+)?(async\s+)?(function|class|def|fn|pub|func|const|let|var|interface|type|struct|enum|impl|trait|public|private|protected)\b",
    )
    .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub fn from_score(score: usize) -> Self {
        match score {
            0..=5 => ComplexityLevel::Low,
            6..=10 => ComplexityLevel::Medium,
            11..=20 => ComplexityLevel::High,
            _ => ComplexityLevel::VeryHigh,
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplexityLevel::Low => write!(f, "low"),
            ComplexityLevel::Medium => write!(f, "medium"),
            ComplexityLevel::High => write!(f, "high"),
            ComplexityLevel::VeryHigh => write!(f, "very-high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeComplexity {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub score: usize,
    pub level: ComplexityLevel,
    pub recommendations: Vec<String>,
}

impl CodeComplexity {
    fn new(file: String, function: Option<String>, score: usize) -> Self {
        Self {
            file,
            function,
            score,
            level: ComplexityLevel::from_score(score),
            recommendations: recommendations(score),
        }
    }
}

/// 1 plus the number of decision tokens in `lines`.
pub fn complexity_score<S: AsRef<str>>(lines: &[S]) -> usize {
    1 + lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            DECISION_TOKENS
                .iter()
                .map(|token| line.matches(token).count())
                .sum::<usize>()
        })
        .sum::<usize>()
}

fn recommendations(score: usize) -> Vec<String> {
    let mut out = Vec::new();
    if score > 10 {
        out.push("Consider breaking this code into smaller functions".to_string());
        out.push("Reduce nesting with early returns or guard clauses".to_string());
        out.push("Extract complex conditions into well-named helpers".to_string());
    }
    if score > 20 {
        out.push("Complexity is very high: refactor before adding features".to_string());
        out.push("Cover every branch with unit tests before refactoring".to_string());
    }
    out
}

/// Range from a declaration (0-based `start`) to the next top-level declaration.
pub fn structured_range(lines: &[&str], start: usize) -> Range<usize> {
    let start = start.min(lines.len());
    let end = match TOP_LEVEL_DECL.as_ref() {
        Some(decl) => lines
            .iter()
            .enumerate()
            .skip(start + 1)
            .find(|(_, line)| decl.is_match(line))
            .map(|(i, _)| i)
            .unwrap_or(lines.len()),
        None => lines.len(),
    };
    start..end
}

/// Locate `name` by text search and approximate its body.
pub fn fallback_range(lines: &[&str], name: &str) -> Option<Range<usize>> {
    let needles = [
        format!("function {name}"),
        format!("{name}("),
        format!("const {name} ="),
    ];
    let start = lines
        .iter()
        .position(|line| needles.iter().any(|n| line.contains(n.as_str())))?;
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 3)
        .find(|(_, line)| line.trim_end() == "}")
        .map(|(i, _)| i + 1)
        .unwrap_or(lines.len());
    Some(start..end)
}

/// Complexity of `source`, or of one function in it.
pub fn complexity_for_source(
    path: &Path,
    label: &str,
    source: &str,
    function: Option<&str>,
    extractor: &SourceExtractor,
) -> Result<CodeComplexity> {
    let lines: Vec<&str> = source.lines().collect();
    let Some(name) = function else {
        return Ok(CodeComplexity::new(
            label.to_string(),
            None,
            complexity_score(&lines),
        ));
    };

    let not_found = || ScopeError::TargetNotFound {
        file: path.to_path_buf(),
        function: name.to_string(),
    };

    let range = match extractor.functions(path, source) {
        Some(functions) => {
            let decl = functions
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(not_found)?;
            structured_range(&lines, decl.line.saturating_sub(1))
        }
        None => fallback_range(&lines, name).ok_or_else(not_found)?,
    };

    debug!(file = label, function = name, start = range.start + 1, end = range.end, "scoped complexity");
    Ok(CodeComplexity::new(
        label.to_string(),
        Some(name.to_string()),
        complexity_score(&lines[range]),
    ))
}

/// Complexity of `file`, optionally narrowed to `function`.
pub async fn calculate_complexity(
    file: &Path,
    function: Option<&str>,
    extractor: &SourceExtractor,
) -> Result<CodeComplexity> {
    if !tokio::fs::try_exists(file).await.unwrap_or(false) {
        return Err(ScopeError::NotFound(file.to_path_buf()));
    }
    let source = read_source(file).await?;
    complexity_for_source(
        file,
        &file.display().to_string(),
        &source,
        function,
        extractor,
    )
}

/// Per-function (or per-file in fallback mode) complexity for a whole project,
/// highest score first.
pub async fn project_complexity(
    root: &Path,
    extractor: &SourceExtractor,
    ignore: &IgnoreSet,
) -> Result<Vec<CodeComplexity>> {
    if !tokio::fs::try_exists(root).await.unwrap_or(false) {
        return Err(ScopeError::NotFound(root.to_path_buf()));
    }

    let mut report = Vec::new();
    for path in source_files(root, ignore) {
        let source = match read_source(&path).await {
            Ok(source) => source,
            Err(e) if e.is_per_file() => {
                warn!(error = %e, "skipping file");
                continue;
            }
            Err(e) => return Err(e),
        };
        let label = relative_path(root, &path);
        let lines: Vec<&str> = source.lines().collect();

        match extractor.functions(&path, &source) {
            Some(functions) if !functions.is_empty() => {
                for func in functions {
                    let range = structured_range(&lines, func.line.saturating_sub(1));
                    report.push(CodeComplexity::new(
                        label.clone(),
                        Some(func.name),
                        complexity_score(&lines[range]),
                    ));
                }
            }
            _ => report.push(CodeComplexity::new(
                label,
                None,
                complexity_score(&lines),
            )),
        }
    }

    report.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.function.cmp(&b.function))
    });
    info!(entries = report.len(), "complexity report built");
    Ok(report)
}
