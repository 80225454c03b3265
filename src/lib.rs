//! # Codescope
//!
//! Project analysis for AI agents: structure, dependencies and code quality.
//!
//! Codescope walks a project directory and answers questions about it without
//! running any of its code.
//!
//! ## Key Features
//!
//! - **Structure**: directory tree with sizes, languages and per-language stats
//! - **Dependencies**: import graph per file, with circular-dependency detection
//! - **Quality**: complexity estimates, code smells and naming-convention test coverage
//! - **Stack**: languages, frameworks and tooling detected from manifests
//! - **Degrades gracefully**: tree-sitter extraction when available, text heuristics otherwise
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codescope::Analyzer;
//!
//! # async fn demo() -> codescope::Result<()> {
//! let analyzer = Analyzer::for_project(".");
//!
//! let graph = analyzer.dependencies(None).await?;
//! for cycle in &graph.circular {
//!     println!("cycle: {}", cycle.join(" -> "));
//! }
//!
//! let smells = analyzer.smells(None).await?;
//! println!("{} smells", smells.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod mcp;
pub mod metrics;
pub mod parser;
pub mod scanner;

// Re-exports for convenience
pub use analyzer::Analyzer;
pub use config::{ScopeConfig, SmellThresholds};
pub use error::{Result, ScopeError};

pub use graph::{build_dependency_graph, DependencyEdge, DependencyGraph, DependencyNode, EdgeKind};
pub use metrics::{
    analyze_test_coverage, calculate_complexity, detect_code_smells, detect_tech_stack,
    project_complexity, CodeComplexity, CodeSmell, ComplexityLevel, FileCoverage, Severity,
    SmellType, TechStack, TestCoverage,
};
pub use parser::{ParserRegistry, SourceExtractor, SupportedLanguage};
pub use scanner::{scan, FileKind, FileNode, LanguageStats, ProjectStructure, Scanner};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn sample_project(root: &Path) {
        write(root, "src/a.js", "import b from 'b.js';\nexport const a = 1;\n");
        write(root, "src/b.ts", "import { c } from './c';\n");
        write(root, "src/deep/nested/c.py", "import os\n\ndef c():\n    return 1\n");
        write(root, "lib/util.go", "package lib\n\nimport \"fmt\"\n");
        write(root, "README.md", "# sample\n");
        write(root, "node_modules/dep/index.js", "module.exports = 1;\n");
    }

    #[tokio::test]
    async fn test_total_files_matches_tree_leaves() {
        let dir = tempdir().unwrap();
        sample_project(dir.path());

        for depth in 0..4 {
            let structure = scan(dir.path(), depth).await.unwrap();
            let leaves: usize = structure
                .files
                .iter()
                .map(|node| node.files().len())
                .sum();
            assert_eq!(structure.total_files, leaves, "depth {depth}");
        }
    }

    #[tokio::test]
    async fn test_language_percentages_sum_to_hundred() {
        let dir = tempdir().unwrap();
        sample_project(dir.path());
        write(dir.path(), "src/d.js", "export default 4;\n");
        write(dir.path(), "src/e.rs", "fn e() {}\n");

        let structure = scan(dir.path(), 5).await.unwrap();
        let total: f64 = structure.languages.iter().map(|l| l.percentage).sum();
        assert!((total - 100.0).abs() < 0.05, "sum was {total}");
    }

    #[tokio::test]
    async fn test_three_file_cycle() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "a.js", "import b from 'b.js';\n");
        write(root, "b.js", "import c from 'c.js';\n");
        write(root, "c.js", "import a from 'a.js';\n");

        let graph = Analyzer::for_project(root).dependencies(None).await.unwrap();
        assert_eq!(
            graph.circular,
            vec![vec![
                "a.js".to_string(),
                "b.js".to_string(),
                "c.js".to_string(),
                "a.js".to_string()
            ]]
        );
    }

    #[tokio::test]
    async fn test_two_ifs_and_one_and_score_four() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("check.js");
        fs::write(
            &file,
            "function check(a, b) {\n  if (a) {\n    return 1;\n  }\n  if (a && b) {\n    return 2;\n  }\n  return 0;\n}\n",
        )
        .unwrap();

        for extractor in [SourceExtractor::default(), SourceExtractor::fallback()] {
            let result = calculate_complexity(&file, None, &extractor).await.unwrap();
            assert_eq!(result.score, 4);
            assert_eq!(result.level, ComplexityLevel::Low);
            assert!(result.recommendations.is_empty());
        }
    }

    #[tokio::test]
    async fn test_large_untested_file_and_covered_sibling() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let big: String = (0..600).map(|i| format!("console.log('line {i}');\n")).collect();
        write(root, "big.js", &big);
        write(root, "foo.js", "export const foo = 1;\n");
        write(root, "foo.test.js", "test('foo', () => {});\n");

        let analyzer = Analyzer::for_project(root);

        let smells = analyzer
            .smells(Some(&[SmellType::LargeFile][..]))
            .await
            .unwrap();
        assert_eq!(smells.len(), 1);
        assert_eq!(smells[0].file, "big.js");
        assert_eq!(smells[0].severity, Severity::Medium);

        let coverage = analyzer.test_coverage().await.unwrap();
        assert!(coverage.missing.contains(&"big.js".to_string()));
        let foo = coverage.files.iter().find(|f| f.file == "foo.js").unwrap();
        assert!(foo.covered);
    }

    #[tokio::test]
    async fn test_react_only_project() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{"dependencies": {"react": "^18.0.0"}}"#,
        );

        let stack = detect_tech_stack(dir.path()).await.unwrap();
        assert_eq!(stack.frameworks.len(), 1);
        assert!(stack.frameworks.contains("React"));
        assert!(stack.languages.contains("JavaScript"));
        assert!(stack.languages.contains("TypeScript"));
    }

    #[tokio::test]
    async fn test_repeated_analysis_is_identical() {
        let dir = tempdir().unwrap();
        sample_project(dir.path());
        let analyzer = Analyzer::for_project(dir.path());

        let first = (
            serde_json::to_string(&analyzer.structure(None, true).await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.dependencies(None).await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.smells(None).await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.complexity_report().await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.test_coverage().await.unwrap()).unwrap(),
        );
        let second = (
            serde_json::to_string(&analyzer.structure(None, true).await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.dependencies(None).await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.smells(None).await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.complexity_report().await.unwrap()).unwrap(),
            serde_json::to_string(&analyzer.test_coverage().await.unwrap()).unwrap(),
        );
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found_everywhere() {
        let analyzer = Analyzer::for_project("/no/such/project");
        assert!(matches!(analyzer.structure(None, false).await, Err(ScopeError::NotFound(_))));
        assert!(matches!(analyzer.dependencies(None).await, Err(ScopeError::NotFound(_))));
        assert!(matches!(analyzer.smells(None).await, Err(ScopeError::NotFound(_))));
        assert!(matches!(analyzer.tech_stack().await, Err(ScopeError::NotFound(_))));
        assert!(matches!(analyzer.test_coverage().await, Err(ScopeError::NotFound(_))));
        assert!(matches!(analyzer.complexity_report().await, Err(ScopeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_undecodable_file_is_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "ok.js", "export function ok() {\n  return 1;\n}\n");
        fs::write(root.join("bad.js"), [0xff, 0xfe, 0x00]).unwrap();
        let analyzer = Analyzer::for_project(root);

        let graph = analyzer.dependencies(None).await.unwrap();
        let paths: Vec<&str> = graph.nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["ok.js"]);

        let smells = analyzer.smells(None).await.unwrap();
        assert!(smells.iter().all(|s| s.file != "bad.js"));

        let report = analyzer.complexity_report().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].file, "ok.js");
    }
}
