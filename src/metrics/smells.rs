//! Code smell detection by line-based text heuristics.
//!
//! - Long Method: a function start followed by a brace-balanced body longer
//!   than the threshold. Brace-less bodies (Python) never close and are not
//!   reported.
//! - Magic Number: a run of 3+ digits with value above 10 on a line without
//!   `//`, `const` or `let`.
//! - Duplicate Code: the whitespace-normalized lines after a function start
//!   used as a fingerprint; a repeated fingerprint in the same file is
//!   reported at its second occurrence.
//! - Large File: more lines than the threshold.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::{ScopeConfig, SmellThresholds};
use crate::error::{Result, ScopeError};
use crate::parser::{read_source, SupportedLanguage};
use crate::scanner::{relative_path, source_files, IgnoreSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SmellType {
    #[serde(rename = "Long Method")]
    LongMethod,
    #[serde(rename = "Magic Number")]
    MagicNumber,
    #[serde(rename = "Duplicate Code")]
    DuplicateCode,
    #[serde(rename = "Large File")]
    LargeFile,
}

impl SmellType {
    pub const ALL: [SmellType; 4] = [
        SmellType::LongMethod,
        SmellType::MagicNumber,
        SmellType::DuplicateCode,
        SmellType::LargeFile,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SmellType::LongMethod => "Long Method",
            SmellType::MagicNumber => "Magic Number",
            SmellType::DuplicateCode => "Duplicate Code",
            SmellType::LargeFile => "Large File",
        }
    }
}

impl fmt::Display for SmellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SmellType {
    type Err = ScopeError;

    /// Accepts "Long Method", "long-method", "long_method", "longmethod".
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "longmethod" => Ok(SmellType::LongMethod),
            "magicnumber" => Ok(SmellType::MagicNumber),
            "duplicatecode" | "duplicate" => Ok(SmellType::DuplicateCode),
            "largefile" => Ok(SmellType::LargeFile),
            _ => Err(ScopeError::InvalidSmellType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSmell {
    #[serde(rename = "type")]
    pub smell_type: SmellType,
    pub severity: Severity,
    pub file: String,
    /// 1-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    pub recommendation: String,
}

/// Function-start patterns per language. Each exposes a `name` group.
static FUNCTION_STARTS: LazyLock<HashMap<SupportedLanguage, Vec<Regex>>> = LazyLock::new(|| {
    let js: &[&str] = &[
        r"^\s*(export\s+)?(default\s+)?(async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\(",
        r"^\s*(export\s+)?(const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(async\s+)?(function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
        r"^\s*((public|private|protected|static|async|readonly|override)\s+)*(?P<name>[A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(:\s*[^{]+)?\{",
    ];
    let python: &[&str] = &[r"^\s*(async\s+)?def\s+(?P<name>\w+)\s*\("];
    let java: &[&str] = &[
        r"^\s*((public|private|protected|static|final|abstract|synchronized)\s+)+[\w<>\[\],.?]+\s+(?P<name>\w+)\s*\(",
        r"^\s*(public|private|protected)\s+(?P<name>[A-Z]\w*)\s*\(",
    ];
    let go: &[&str] = &[r"^\s*func\s+(\([^)]*\)\s*)?(?P<name>\w+)\s*[\[(]"];
    let rust: &[&str] = &[
        r#"^\s*(pub(\([^)]*\))?\s+)?(default\s+)?(const\s+)?(async\s+)?(unsafe\s+)?(extern\s+"[^"]*"\s+)?fn\s+(?P<name>\w+)"#,
    ];

    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
    };

    let mut map = HashMap::new();
    for lang in [
        SupportedLanguage::JavaScript,
        SupportedLanguage::TypeScript,
        SupportedLanguage::Tsx,
    ] {
        map.insert(lang, compile(js));
    }
    map.insert(SupportedLanguage::Python, compile(python));
    map.insert(SupportedLanguage::Java, compile(java));
    map.insert(SupportedLanguage::Go, compile(go));
    map.insert(SupportedLanguage::Rust, compile(rust));
    map
});

/// Control-flow keywords the JS method pattern would otherwise accept.
const NOT_FUNCTION_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "return", "function", "else", "do",
];

/// Name of the function starting on `line`, if any.
pub fn function_start(line: &str, lang: SupportedLanguage) -> Option<String> {
    let patterns = FUNCTION_STARTS.get(&lang)?;
    patterns.iter().find_map(|re| {
        let name = re.captures(line)?.name("name")?.as_str();
        (!NOT_FUNCTION_NAMES.contains(&name)).then(|| name.to_string())
    })
}

/// Line count of the brace-balanced body starting at `start`, or `None` if
/// it never opens and closes.
pub fn brace_body_length(lines: &[&str], start: usize) -> Option<usize> {
    let mut balance: i64 = 0;
    let mut opened = false;
    for (i, line) in lines.iter().enumerate().skip(start) {
        let opens = line.matches('{').count() as i64;
        let closes = line.matches('}').count() as i64;
        if opens > 0 {
            opened = true;
        }
        balance += opens - closes;
        if opened && balance <= 0 {
            return Some(i - start + 1);
        }
    }
    None
}

fn normalize(lines: &[&str]) -> String {
    lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Options for a smell scan.
#[derive(Debug, Clone, Default)]
pub struct SmellOptions {
    pub thresholds: SmellThresholds,
    pub ignore: IgnoreSet,
}

impl SmellOptions {
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self {
            thresholds: config.smells.clone(),
            ignore: IgnoreSet::from_config(config),
        }
    }
}

/// Smells in one file's text. `file` is the label used in results.
pub fn smells_in_source(
    file: &str,
    source: &str,
    lang: SupportedLanguage,
    enabled: &BTreeSet<SmellType>,
    thresholds: &SmellThresholds,
) -> Vec<CodeSmell> {
    let lines: Vec<&str> = source.lines().collect();
    let starts: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| function_start(line, lang).map(|name| (i, name)))
        .collect();

    let mut smells = Vec::new();
    for smell_type in enabled {
        match smell_type {
            SmellType::LongMethod => long_methods(file, &lines, &starts, thresholds, &mut smells),
            SmellType::MagicNumber => magic_numbers(file, &lines, thresholds, &mut smells),
            SmellType::DuplicateCode => duplicates(file, &lines, &starts, thresholds, &mut smells),
            SmellType::LargeFile => large_file(file, lines.len(), thresholds, &mut smells),
        }
    }
    smells
}

fn long_methods(
    file: &str,
    lines: &[&str],
    starts: &[(usize, String)],
    thresholds: &SmellThresholds,
    out: &mut Vec<CodeSmell>,
) {
    for (start, name) in starts {
        let Some(length) = brace_body_length(lines, *start) else {
            continue;
        };
        if length <= thresholds.long_method_lines {
            continue;
        }
        let severity = if length > thresholds.long_method_high {
            Severity::High
        } else {
            Severity::Medium
        };
        out.push(CodeSmell {
            smell_type: SmellType::LongMethod,
            severity,
            file: file.to_string(),
            line: Some(start + 1),
            message: format!("Function '{name}' is {length} lines long"),
            recommendation: format!(
                "Split '{name}' into smaller functions of at most {} lines",
                thresholds.long_method_lines
            ),
        });
    }
}

fn magic_numbers(
    file: &str,
    lines: &[&str],
    thresholds: &SmellThresholds,
    out: &mut Vec<CodeSmell>,
) {
    let digits = thresholds.magic_number_min_digits.max(1);
    let Ok(number) = Regex::new(&format!(r"\b\d{{{digits},}}\b")) else {
        return;
    };
    for (i, line) in lines.iter().enumerate() {
        if line.contains("//") || line.contains("const") || line.contains("let") {
            continue;
        }
        for m in number.find_iter(line) {
            // Digit runs too long for u128 are certainly above 10.
            let above_ten = m.as_str().parse::<u128>().map_or(true, |v| v > 10);
            if !above_ten {
                continue;
            }
            out.push(CodeSmell {
                smell_type: SmellType::MagicNumber,
                severity: Severity::Low,
                file: file.to_string(),
                line: Some(i + 1),
                message: format!("Magic number {} found", m.as_str()),
                recommendation: "Replace the literal with a named constant".to_string(),
            });
        }
    }
}

fn duplicates(
    file: &str,
    lines: &[&str],
    starts: &[(usize, String)],
    thresholds: &SmellThresholds,
    out: &mut Vec<CodeSmell>,
) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (start, name) in starts {
        let from = (start + 1).min(lines.len());
        let to = (from + thresholds.duplicate_window).min(lines.len());
        let fingerprint = normalize(&lines[from..to]);
        if fingerprint.is_empty() {
            continue;
        }
        match seen.get(&fingerprint) {
            Some(&first) => out.push(CodeSmell {
                smell_type: SmellType::DuplicateCode,
                severity: Severity::Medium,
                file: file.to_string(),
                line: Some(start + 1),
                message: format!(
                    "Body of '{name}' duplicates the code after line {}",
                    first + 1
                ),
                recommendation: "Extract the shared code into a common function".to_string(),
            }),
            None => {
                seen.insert(fingerprint, *start);
            }
        }
    }
}

fn large_file(file: &str, line_count: usize, thresholds: &SmellThresholds, out: &mut Vec<CodeSmell>) {
    if line_count <= thresholds.large_file_lines {
        return;
    }
    let severity = if line_count > thresholds.large_file_high {
        Severity::High
    } else {
        Severity::Medium
    };
    out.push(CodeSmell {
        smell_type: SmellType::LargeFile,
        severity,
        file: file.to_string(),
        line: None,
        message: format!("File has {line_count} lines"),
        recommendation: "Split the file into smaller modules".to_string(),
    });
}

/// Scan every source file under `root` for the enabled smell types
/// (all of them when `types` is `None`). Unreadable files are skipped.
pub async fn detect_code_smells(
    root: &Path,
    types: Option<&[SmellType]>,
    options: &SmellOptions,
) -> Result<Vec<CodeSmell>> {
    if !tokio::fs::try_exists(root).await.unwrap_or(false) {
        return Err(ScopeError::NotFound(root.to_path_buf()));
    }
    let enabled: BTreeSet<SmellType> = match types {
        Some(types) => types.iter().copied().collect(),
        None => SmellType::ALL.into_iter().collect(),
    };

    let mut smells = Vec::new();
    for path in source_files(root, &options.ignore) {
        let Some(lang) = SupportedLanguage::from_path(&path) else {
            continue;
        };
        let source = match read_source(&path).await {
            Ok(source) => source,
            Err(e) if e.is_per_file() => {
                warn!(error = %e, "skipping file");
                continue;
            }
            Err(e) => return Err(e),
        };
        let label = relative_path(root, &path);
        let found = smells_in_source(&label, &source, lang, &enabled, &options.thresholds);
        debug!(file = %label, smells = found.len(), "scanned file");
        smells.extend(found);
    }

    info!(smells = smells.len(), "smell scan complete");
    Ok(smells)
}
