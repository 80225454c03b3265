//! Language detection and tree-sitter grammar loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::Language;

/// Label for extensions the classifier does not know.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Extensions analyzed by the dependency graph, smell scan and coverage.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "py", "java", "go", "rs"];

/// Map a file extension (without the dot) to a language label.
///
/// Matching is case-insensitive. Unknown extensions map to
/// [`UNKNOWN_LANGUAGE`].
pub fn language_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "js" | "jsx" | "mjs" | "cjs" => "JavaScript",
        "ts" | "tsx" | "mts" | "cts" => "TypeScript",
        "py" | "pyw" => "Python",
        "java" => "Java",
        "go" => "Go",
        "rs" => "Rust",
        "c" | "h" => "C",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" => "C++",
        "cs" => "C#",
        "rb" => "Ruby",
        "php" => "PHP",
        "swift" => "Swift",
        "kt" | "kts" => "Kotlin",
        "scala" => "Scala",
        "dart" => "Dart",
        "lua" => "Lua",
        "r" => "R",
        "vue" => "Vue",
        "svelte" => "Svelte",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "scss" | "sass" => "SCSS",
        "less" => "Less",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "xml" => "XML",
        "md" | "markdown" => "Markdown",
        "sql" => "SQL",
        "sh" | "bash" | "zsh" => "Shell",
        _ => UNKNOWN_LANGUAGE,
    }
}

/// Language label for a path, based on its extension.
pub fn language_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map(language_for_extension)
        .unwrap_or(UNKNOWN_LANGUAGE)
}

/// True if the path has one of the [`SOURCE_EXTENSIONS`].
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Languages with a tree-sitter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SupportedLanguage {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Java,
}

impl SupportedLanguage {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "rs" => Some(SupportedLanguage::Rust),
            "py" | "pyw" => Some(SupportedLanguage::Python),
            "js" | "mjs" | "cjs" => Some(SupportedLanguage::JavaScript),
            "ts" | "mts" | "cts" => Some(SupportedLanguage::TypeScript),
            "tsx" | "jsx" => Some(SupportedLanguage::Tsx),
            "go" => Some(SupportedLanguage::Go),
            "java" => Some(SupportedLanguage::Java),
            _ => None,
        }
    }

    /// Get the tree-sitter Language for this language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SupportedLanguage::Rust => tree_sitter_rust::LANGUAGE.into(),
            SupportedLanguage::Python => tree_sitter_python::LANGUAGE.into(),
            SupportedLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SupportedLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SupportedLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SupportedLanguage::Go => tree_sitter_go::LANGUAGE.into(),
            SupportedLanguage::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            SupportedLanguage::Rust => "Rust",
            SupportedLanguage::Python => "Python",
            SupportedLanguage::JavaScript => "JavaScript",
            SupportedLanguage::TypeScript => "TypeScript",
            SupportedLanguage::Tsx => "TSX",
            SupportedLanguage::Go => "Go",
            SupportedLanguage::Java => "Java",
        }
    }

    /// Extensions tried when resolving an extensionless import from this language.
    pub fn import_extensions(&self) -> &'static [&'static str] {
        match self {
            SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
                &["ts", "tsx", "js", "jsx"]
            }
            SupportedLanguage::Python => &["py"],
            SupportedLanguage::Rust => &["rs"],
            SupportedLanguage::Go => &["go"],
            SupportedLanguage::Java => &["java"],
        }
    }

    /// Check if two languages are in the same ecosystem (can import each other).
    pub fn same_ecosystem(&self, other: &Self) -> bool {
        use SupportedLanguage::*;
        match (self, other) {
            (JavaScript | TypeScript | Tsx, JavaScript | TypeScript | Tsx) => true,
            _ => self == other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_labels() {
        assert_eq!(language_for_extension("ts"), "TypeScript");
        assert_eq!(language_for_extension("TSX"), "TypeScript");
        assert_eq!(language_for_extension("jsx"), "JavaScript");
        assert_eq!(language_for_extension("rs"), "Rust");
        assert_eq!(language_for_extension("xyz"), UNKNOWN_LANGUAGE);
        assert_eq!(language_for_extension(""), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_path_without_extension() {
        assert_eq!(language_for_path(Path::new("Makefile")), UNKNOWN_LANGUAGE);
        assert!(!is_source_file(Path::new("Makefile")));
        assert!(is_source_file(Path::new("src/app.tsx")));
        assert!(!is_source_file(Path::new("README.md")));
    }

    #[test]
    fn test_supported_language_from_path() {
        assert_eq!(
            SupportedLanguage::from_path(&PathBuf::from("a.jsx")),
            Some(SupportedLanguage::Tsx)
        );
        assert_eq!(SupportedLanguage::from_path(&PathBuf::from("a.rb")), None);
        assert!(SupportedLanguage::Tsx.same_ecosystem(&SupportedLanguage::JavaScript));
        assert!(!SupportedLanguage::Go.same_ecosystem(&SupportedLanguage::Java));
    }
}
