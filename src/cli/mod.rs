//! CLI module for Codescope.
//!
//! Commands:
//! - Layout: structure, stack
//! - Graph: deps
//! - Quality: complexity, report, smells, coverage
//!
//! Every command prints text by default and pretty JSON with `--json`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::analyzer::Analyzer;
use crate::graph::DependencyGraph;
use crate::metrics::{CodeComplexity, CodeSmell, SmellType, TechStack, TestCoverage};
use crate::scanner::{FileNode, ProjectStructure};

#[derive(Parser)]
#[command(name = "codescope")]
#[command(about = "Codescope - project structure, dependency and code-quality analysis")]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Print results as pretty JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Directory tree with per-language statistics
    Structure {
        /// Directory depth (default: from config, 3)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Also count lines per language
        #[arg(long)]
        lines: bool,
    },

    /// Import graph and circular dependencies
    Deps {
        /// Analyze only this file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Complexity of one file or function
    Complexity {
        /// File to measure
        file: PathBuf,

        /// Narrow to this function
        #[arg(short, long)]
        function: Option<String>,
    },

    /// Complexity of every function in the project, highest first
    Report {
        /// Max entries to print in text mode
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Code smells (long methods, magic numbers, duplicates, large files)
    Smells {
        /// Only report these smell types (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
    },

    /// Languages, frameworks and tooling detected from manifests
    Stack,

    /// Naming-convention test coverage
    Coverage,
}

/// Execute `cli` and return what should be printed.
pub async fn run(cli: Cli) -> Result<String> {
    let analyzer = Analyzer::for_project(&cli.root);
    let json = cli.json;

    match cli.command {
        Commands::Structure { depth, lines } => {
            let structure = analyzer.structure(depth, lines).await?;
            output(json, &structure, render_structure)
        }
        Commands::Deps { file } => {
            let graph = analyzer.dependencies(file.as_deref()).await?;
            output(json, &graph, render_dependencies)
        }
        Commands::Complexity { file, function } => {
            let result = analyzer.complexity(&file, function.as_deref()).await?;
            output(json, &result, render_complexity)
        }
        Commands::Report { limit } => {
            let report = analyzer.complexity_report().await?;
            output(json, &report, |r| render_report(r, limit))
        }
        Commands::Smells { types } => {
            let types = types
                .iter()
                .map(|t| t.parse::<SmellType>())
                .collect::<crate::Result<Vec<_>>>()?;
            let filter = (!types.is_empty()).then_some(types.as_slice());
            let smells = analyzer.smells(filter).await?;
            output(json, &smells, |s| render_smells(s))
        }
        Commands::Stack => {
            let stack = analyzer.tech_stack().await?;
            output(json, &stack, render_stack)
        }
        Commands::Coverage => {
            let coverage = analyzer.test_coverage().await?;
            output(json, &coverage, render_coverage)
        }
    }
}

fn output<T: Serialize>(json: bool, value: &T, text: impl Fn(&T) -> String) -> Result<String> {
    if json {
        serde_json::to_string_pretty(value).context("failed to serialize result")
    } else {
        Ok(text(value))
    }
}

pub fn render_structure(structure: &ProjectStructure) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project: {}", structure.root_path.display());
    let _ = writeln!(out, "Files:   {}", structure.total_files);
    let _ = writeln!(out, "Size:    {} bytes", structure.total_size);
    out.push('\n');

    if !structure.languages.is_empty() {
        out.push_str("Languages:\n");
        for stats in &structure.languages {
            let _ = write!(
                out,
                "  {:<12} {:>5} files  {:>6.2}%",
                stats.language, stats.files, stats.percentage
            );
            if stats.lines > 0 {
                let _ = write!(out, "  {} lines", stats.lines);
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("Tree:\n");
    write_tree(&mut out, &structure.files, 1);
    out
}

fn write_tree(out: &mut String, nodes: &[FileNode], indent: usize) {
    for node in nodes {
        let pad = "  ".repeat(indent);
        match &node.children {
            Some(children) => {
                let _ = writeln!(out, "{pad}{}/", node.name);
                write_tree(out, children, indent + 1);
            }
            None => {
                let _ = writeln!(out, "{pad}{}", node.name);
            }
        }
    }
}

pub fn render_dependencies(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Nodes: {}", graph.nodes.len());
    let _ = writeln!(out, "Edges: {}", graph.edges.len());
    out.push('\n');

    for node in graph.nodes.iter().filter(|n| !n.imports.is_empty()) {
        let _ = writeln!(out, "{}", node.path);
        for import in &node.imports {
            let _ = writeln!(out, "  -> {}", import);
        }
    }

    if !graph.has_cycles() {
        out.push_str("\nNo circular dependencies\n");
    } else {
        let _ = writeln!(out, "\nCircular dependencies ({}):", graph.circular.len());
        for cycle in &graph.circular {
            let _ = writeln!(out, "  {}", cycle.join(" -> "));
        }
    }
    out
}

fn complexity_target(result: &CodeComplexity) -> String {
    match &result.function {
        Some(function) => format!("{}::{}", result.file, function),
        None => result.file.clone(),
    }
}

pub fn render_complexity(result: &CodeComplexity) -> String {
    let mut out = format!(
        "{}\n  Complexity: {} ({})\n",
        complexity_target(result),
        result.score,
        result.level
    );
    if !result.recommendations.is_empty() {
        out.push_str("  Recommendations:\n");
        for rec in &result.recommendations {
            let _ = writeln!(out, "    - {}", rec);
        }
    }
    out
}

pub fn render_report(report: &[CodeComplexity], limit: usize) -> String {
    let mut out = String::new();
    for entry in report.iter().take(limit) {
        let _ = writeln!(
            out,
            "{:>4}  {:<9}  {}",
            entry.score,
            entry.level.to_string(),
            complexity_target(entry)
        );
    }
    if report.len() > limit {
        let _ = writeln!(out, "... and {} more", report.len() - limit);
    }
    if report.is_empty() {
        out.push_str("No source files found\n");
    }
    out
}

pub fn render_smells(smells: &[CodeSmell]) -> String {
    if smells.is_empty() {
        return "No code smells found\n".to_string();
    }
    let mut out = String::new();
    for smell in smells {
        let location = match smell.line {
            Some(line) => format!("{}:{}", smell.file, line),
            None => smell.file.clone(),
        };
        let _ = writeln!(
            out,
            "[{}] {} {}\n    {}\n    fix: {}",
            smell.severity, smell.smell_type, location, smell.message, smell.recommendation
        );
    }
    let _ = writeln!(out, "\n{} smell(s)", smells.len());
    out
}

pub fn render_stack(stack: &TechStack) -> String {
    if stack.is_empty() {
        return "No tech stack detected\n".to_string();
    }
    let sections = [
        ("Languages", &stack.languages),
        ("Frameworks", &stack.frameworks),
        ("Package managers", &stack.package_managers),
        ("Build tools", &stack.build_tools),
        ("Test frameworks", &stack.test_frameworks),
    ];
    let mut out = String::new();
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        let joined: Vec<&str> = items.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{:<17} {}", format!("{title}:"), joined.join(", "));
    }
    out
}

pub fn render_coverage(coverage: &TestCoverage) -> String {
    let mut out = format!(
        "Coverage: {}/{} files ({:.2}%)\n",
        coverage.covered, coverage.total, coverage.percentage
    );
    if !coverage.missing.is_empty() {
        out.push_str("\nWithout tests:\n");
        for file in &coverage.missing {
            let _ = writeln!(out, "  {}", file);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cli(root: &std::path::Path, json: bool, command: Commands) -> Cli {
        Cli {
            root: root.to_path_buf(),
            json,
            command,
        }
    }

    #[test]
    fn test_parse_args() {
        let parsed = Cli::try_parse_from([
            "codescope", "--root", "/tmp/p", "smells", "--type", "Magic Number", "-t", "large-file",
            "--json",
        ])
        .unwrap();
        assert!(parsed.json);
        match parsed.command {
            Commands::Smells { types } => assert_eq!(types, vec!["Magic Number", "large-file"]),
            _ => panic!("expected smells"),
        }
    }

    #[tokio::test]
    async fn test_deps_text_output() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "import b from 'a.js';\n").unwrap();

        let text = run(cli(dir.path(), false, Commands::Deps { file: None }))
            .await
            .unwrap();
        assert!(text.contains("Nodes: 1"));
        assert!(text.contains("  -> a.js"));
        assert!(text.contains("a.js -> a.js"));
    }

    #[tokio::test]
    async fn test_coverage_json_output() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo.js"), "export const foo = 1;\n").unwrap();

        let json = run(cli(dir.path(), true, Commands::Coverage)).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["missing"], serde_json::json!(["foo.js"]));
    }

    #[tokio::test]
    async fn test_invalid_smell_type_is_an_error() {
        let dir = tempdir().unwrap();
        let result = run(cli(
            dir.path(),
            false,
            Commands::Smells {
                types: vec!["bogus".to_string()],
            },
        ))
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_render_stack() {
        let mut stack = TechStack::default();
        stack.languages.insert("Rust".to_string());
        stack.frameworks.insert("Axum".to_string());
        let text = render_stack(&stack);
        assert!(text.contains("Languages:        Rust"));
        assert!(text.contains("Frameworks:       Axum"));
        assert!(!text.contains("Build tools"));
    }
}
