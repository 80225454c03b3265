//! Facade bundling a project root, its configuration and a source extractor.
//!
//! Front-ends (CLI, MCP tools) construct one [`Analyzer`] per request and call
//! the analysis they need. Nothing is cached between calls apart from the
//! parser registry shared through the extractor.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::ScopeConfig;
use crate::error::Result;
use crate::graph::{build_dependency_graph, DependencyGraph, GraphOptions};
use crate::metrics::{
    analyze_test_coverage, calculate_complexity, detect_code_smells, detect_tech_stack,
    project_complexity, CodeComplexity, CodeSmell, SmellOptions, SmellType, TechStack,
    TestCoverage,
};
use crate::parser::{ParserRegistry, SourceExtractor};
use crate::scanner::{IgnoreSet, ProjectStructure, Scanner};

#[derive(Clone)]
pub struct Analyzer {
    root: PathBuf,
    config: ScopeConfig,
    extractor: SourceExtractor,
}

impl Analyzer {
    pub fn new(root: impl Into<PathBuf>, config: ScopeConfig, extractor: SourceExtractor) -> Self {
        Self {
            root: root.into(),
            config,
            extractor,
        }
    }

    /// Analyzer for `root` with its on-disk config and a shared registry.
    pub fn with_registry(root: impl Into<PathBuf>, registry: Arc<ParserRegistry>) -> Self {
        let root = root.into();
        let config = ScopeConfig::for_project(&root);
        let extractor = if config.structured_parsing {
            SourceExtractor::detect(registry)
        } else {
            SourceExtractor::fallback()
        };
        debug!(root = %root.display(), mode = extractor.mode(), "analyzer ready");
        Self::new(root, config, extractor)
    }

    /// Analyzer for `root` with its on-disk config and a fresh registry.
    pub fn for_project(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(root, Arc::new(ParserRegistry::new()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn extractor(&self) -> &SourceExtractor {
        &self.extractor
    }

    fn ignore(&self) -> IgnoreSet {
        IgnoreSet::from_config(&self.config)
    }

    /// A relative `file` is looked up under the root first.
    async fn locate(&self, file: &Path) -> PathBuf {
        if file.is_relative() {
            let under_root = self.root.join(file);
            if tokio::fs::try_exists(&under_root).await.unwrap_or(false) {
                return under_root;
            }
        }
        file.to_path_buf()
    }

    /// Directory tree and language stats. `max_depth` defaults to the config.
    pub async fn structure(
        &self,
        max_depth: Option<usize>,
        line_counts: bool,
    ) -> Result<ProjectStructure> {
        let mut scanner = Scanner::from_config(&self.config);
        if line_counts {
            scanner = scanner.with_line_counts();
        }
        scanner
            .scan(&self.root, max_depth.unwrap_or(self.config.max_depth))
            .await
    }

    pub async fn dependencies(&self, file: Option<&Path>) -> Result<DependencyGraph> {
        build_dependency_graph(
            &self.root,
            file,
            &self.extractor,
            &GraphOptions::from_config(&self.config),
        )
        .await
    }

    pub async fn complexity(&self, file: &Path, function: Option<&str>) -> Result<CodeComplexity> {
        calculate_complexity(&self.locate(file).await, function, &self.extractor).await
    }

    pub async fn complexity_report(&self) -> Result<Vec<CodeComplexity>> {
        project_complexity(&self.root, &self.extractor, &self.ignore()).await
    }

    pub async fn smells(&self, types: Option<&[SmellType]>) -> Result<Vec<CodeSmell>> {
        detect_code_smells(&self.root, types, &SmellOptions::from_config(&self.config)).await
    }

    pub async fn tech_stack(&self) -> Result<TechStack> {
        detect_tech_stack(&self.root).await
    }

    pub async fn test_coverage(&self) -> Result<TestCoverage> {
        analyze_test_coverage(&self.root, &self.ignore()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScopeError;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_disables_structured_parsing() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".codescope")).unwrap();
        fs::write(
            dir.path().join(".codescope/config.toml"),
            "structured_parsing = false\nmax_depth = 0\n",
        )
        .unwrap();

        let analyzer = Analyzer::for_project(dir.path());
        assert_eq!(analyzer.extractor().mode(), "fallback");
        assert_eq!(analyzer.config().max_depth, 0);
    }

    #[tokio::test]
    async fn test_config_ignore_applies_to_every_analysis() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".codescope")).unwrap();
        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join(".codescope/config.toml"), "ignore = [\"generated\"]\n").unwrap();
        fs::write(root.join("generated/big.js"), "import x from 'y';\n").unwrap();
        fs::write(root.join("app.js"), "import y from 'z';\n").unwrap();

        let analyzer = Analyzer::for_project(root);
        let structure = analyzer.structure(None, false).await.unwrap();
        assert_eq!(structure.total_files, 1);

        let graph = analyzer.dependencies(None).await.unwrap();
        assert_eq!(graph.nodes.len(), 1);

        let coverage = analyzer.test_coverage().await.unwrap();
        assert_eq!(coverage.missing, vec!["app.js"]);
    }

    #[tokio::test]
    async fn test_complexity_file_relative_to_root() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("main.py"),
            "def f(x):\n    if x and x > 1:\n        return 1\n    return 0\n",
        )
        .unwrap();

        let analyzer = Analyzer::for_project(dir.path());
        let result = analyzer.complexity(Path::new("main.py"), Some("f")).await.unwrap();
        assert_eq!(result.function.as_deref(), Some("f"));
        assert_eq!(result.score, 2);

        let missing = analyzer.complexity(Path::new("ghost.py"), None).await;
        assert!(matches!(missing, Err(ScopeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_complexity_file_nested_or_absolute() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let source = dir.path().join("src/check.js");
        fs::write(&source, "function check(a) {\n  while (a) { a--; }\n}\n").unwrap();

        let analyzer = Analyzer::for_project(dir.path());
        let relative = analyzer.complexity(Path::new("src/check.js"), None).await.unwrap();
        let absolute = analyzer.complexity(&source, None).await.unwrap();
        assert_eq!(relative.score, 2);
        assert_eq!(absolute.score, relative.score);
    }
}
