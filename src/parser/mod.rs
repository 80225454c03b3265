//! Source extraction: imports and function declarations.
//!
//! Extraction sits behind the [`SourceParser`] capability. Two implementations
//! exist: [`TreeSitterParser`] builds a syntax tree, [`FallbackParser`] does
//! nothing and reports [`ScopeError::ParseFailure`]. [`SourceExtractor`] picks
//! one at construction and turns parse failures into fallback results, so
//! callers never branch on the active mode themselves.

pub mod functions;
pub mod imports;
pub mod language;
pub mod registry;

pub use functions::ExtractedFunction;
pub use language::{
    is_source_file, language_for_extension, language_for_path, SupportedLanguage,
    SOURCE_EXTENSIONS, UNKNOWN_LANGUAGE,
};
pub use registry::ParserRegistry;

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, ScopeError};

/// Capability for structured extraction from source text.
pub trait SourceParser: Send + Sync {
    /// Raw import identifiers in source order.
    fn imports(&self, path: &Path, source: &str) -> Result<Vec<String>>;

    /// Function and method declarations in source order.
    fn functions(&self, path: &Path, source: &str) -> Result<Vec<ExtractedFunction>>;

    /// Short name for logs.
    fn mode(&self) -> &'static str;
}

/// Tree-sitter backed parser using a shared [`ParserRegistry`].
#[derive(Debug, Clone)]
pub struct TreeSitterParser {
    registry: Arc<ParserRegistry>,
}

impl TreeSitterParser {
    pub fn new(registry: Arc<ParserRegistry>) -> Self {
        Self { registry }
    }

    fn language(path: &Path) -> Result<SupportedLanguage> {
        SupportedLanguage::from_path(path)
            .ok_or_else(|| ScopeError::UnsupportedLanguage(path.display().to_string()))
    }
}

impl SourceParser for TreeSitterParser {
    fn imports(&self, path: &Path, source: &str) -> Result<Vec<String>> {
        let lang = Self::language(path)?;
        let tree = self.registry.parse(lang, path, source)?;
        Ok(imports::extract_imports(
            &tree.root_node(),
            source.as_bytes(),
            lang,
        ))
    }

    fn functions(&self, path: &Path, source: &str) -> Result<Vec<ExtractedFunction>> {
        let lang = Self::language(path)?;
        let tree = self.registry.parse(lang, path, source)?;
        Ok(functions::extract_functions(
            &tree.root_node(),
            source.as_bytes(),
            lang,
        ))
    }

    fn mode(&self) -> &'static str {
        "structured"
    }
}

/// Parser used when no structured parser is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackParser;

impl SourceParser for FallbackParser {
    fn imports(&self, path: &Path, _source: &str) -> Result<Vec<String>> {
        Err(ScopeError::parse(path, "no structured parser available"))
    }

    fn functions(&self, path: &Path, _source: &str) -> Result<Vec<ExtractedFunction>> {
        Err(ScopeError::parse(path, "no structured parser available"))
    }

    fn mode(&self) -> &'static str {
        "fallback"
    }
}

/// Entry point for extraction, independent of the active parser.
#[derive(Clone)]
pub struct SourceExtractor {
    parser: Arc<dyn SourceParser>,
}

impl SourceExtractor {
    /// Wrap any parser capability.
    pub fn new(parser: Arc<dyn SourceParser>) -> Self {
        Self { parser }
    }

    /// Tree-sitter extraction backed by `registry`.
    pub fn structured(registry: Arc<ParserRegistry>) -> Self {
        Self::new(Arc::new(TreeSitterParser::new(registry)))
    }

    /// Extraction that always degrades to the text heuristics.
    pub fn fallback() -> Self {
        Self::new(Arc::new(FallbackParser))
    }

    /// Choose the mode once: structured if the grammars load, fallback otherwise.
    pub fn detect(registry: Arc<ParserRegistry>) -> Self {
        if registry.supports(SupportedLanguage::JavaScript) {
            Self::structured(registry)
        } else {
            info!("tree-sitter unavailable, using fallback extraction");
            Self::fallback()
        }
    }

    pub fn mode(&self) -> &'static str {
        self.parser.mode()
    }

    /// Import identifiers for `source`. Empty when extraction fails.
    pub fn imports(&self, path: &Path, source: &str) -> Vec<String> {
        match self.parser.imports(path, source) {
            Ok(imports) => imports,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "import extraction skipped");
                Vec::new()
            }
        }
    }

    /// Function declarations for `source`, or `None` in fallback mode.
    ///
    /// `None` tells callers to use whole-file heuristics instead.
    pub fn functions(&self, path: &Path, source: &str) -> Option<Vec<ExtractedFunction>> {
        match self.parser.functions(path, source) {
            Ok(functions) => Some(functions),
            Err(e) => {
                debug!(file = %path.display(), error = %e, "function extraction skipped");
                None
            }
        }
    }

    /// Read `path` and extract its imports.
    pub async fn extract_imports(&self, path: &Path) -> Result<Vec<String>> {
        let source = read_source(path).await?;
        Ok(self.imports(path, &source))
    }

    /// Read `path` and extract its functions. Empty in fallback mode.
    pub async fn extract_functions(&self, path: &Path) -> Result<Vec<ExtractedFunction>> {
        let source = read_source(path).await?;
        Ok(self.functions(path, &source).unwrap_or_default())
    }
}

impl Default for SourceExtractor {
    fn default() -> Self {
        Self::detect(Arc::new(ParserRegistry::new()))
    }
}

impl std::fmt::Debug for SourceExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceExtractor")
            .field("mode", &self.mode())
            .finish()
    }
}

/// Read a file as UTF-8 text.
pub async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ScopeError::read(path, e))
}
