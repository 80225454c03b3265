//! Per-language tree-sitter parser cache.
//!
//! The registry is an ordinary value owned by whoever builds the extractor.
//! Parsers are created lazily on first use and reused for every file of
//! that language. A `Parser` is not `Sync`, so parsing runs under a lock.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use tree_sitter::{Parser, Tree};

use super::language::SupportedLanguage;
use crate::error::{Result, ScopeError};

#[derive(Default)]
pub struct ParserRegistry {
    parsers: Mutex<HashMap<SupportedLanguage, Parser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` with the cached parser for `lang`.
    pub fn parse(&self, lang: SupportedLanguage, path: &Path, source: &str) -> Result<Tree> {
        let mut parsers = self
            .parsers
            .lock()
            .map_err(|e| ScopeError::parse(path, format!("parser cache poisoned: {e}")))?;

        if !parsers.contains_key(&lang) {
            let mut parser = Parser::new();
            parser
                .set_language(&lang.tree_sitter_language())
                .map_err(|e| ScopeError::parse(path, e.to_string()))?;
            debug!(language = lang.name(), "created parser");
            parsers.insert(lang, parser);
        }

        let parser = parsers
            .get_mut(&lang)
            .ok_or_else(|| ScopeError::parse(path, "parser missing from cache"))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ScopeError::parse(path, "tree-sitter returned no tree"))
    }

    /// Whether a grammar for `lang` can be loaded.
    pub fn supports(&self, lang: SupportedLanguage) -> bool {
        self.parse(lang, Path::new("<check>"), "").is_ok()
    }

    /// Number of parser instances created so far.
    pub fn cached(&self) -> usize {
        self.parsers.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("cached", &self.cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsers_cached_per_language() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.cached(), 0);

        registry
            .parse(SupportedLanguage::Rust, Path::new("a.rs"), "fn a() {}")
            .unwrap();
        registry
            .parse(SupportedLanguage::Rust, Path::new("b.rs"), "fn b() {}")
            .unwrap();
        assert_eq!(registry.cached(), 1);

        registry
            .parse(SupportedLanguage::Python, Path::new("c.py"), "def c(): pass")
            .unwrap();
        assert_eq!(registry.cached(), 2);
    }

    #[test]
    fn test_fresh_registries_are_independent() {
        let a = ParserRegistry::new();
        let b = ParserRegistry::new();
        assert!(a.supports(SupportedLanguage::Go));
        assert_eq!(a.cached(), 1);
        assert_eq!(b.cached(), 0);
    }
}
