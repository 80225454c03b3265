//! Error types for Codescope.
//!
//! Per-request failures (missing root, missing target function) are surfaced
//! to the caller. Per-file failures inside multi-file operations are logged
//! and skipped by the operation itself.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for analysis operations.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The project root or requested file does not exist.
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A single file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structured extraction failed or no parser is available.
    #[error("failed to parse {}: {message}", path.display())]
    ParseFailure { path: PathBuf, message: String },

    /// The requested function is not declared in the file.
    #[error("function '{function}' not found in {}", file.display())]
    TargetNotFound { file: PathBuf, function: String },

    /// No grammar is registered for the file's language.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A smell filter did not name a known smell type.
    #[error("unknown smell type: {0}")]
    InvalidSmellType(String),

    /// The configuration file exists but could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScopeError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScopeError::ReadFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ScopeError::ParseFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for failures that only affect one file of a multi-file operation.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            ScopeError::ReadFailure { .. }
                | ScopeError::ParseFailure { .. }
                | ScopeError::UnsupportedLanguage(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScopeError>;
