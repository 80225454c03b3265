//! Project configuration loaded from `.codescope/config.toml`.
//!
//! Every field has a default, so a missing or partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, ScopeError};

/// Directory (relative to the project root) holding the config file.
pub const CONFIG_DIR: &str = ".codescope";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Depth used by the scanner when the caller gives none.
    pub max_depth: usize,
    /// Extra entry names pruned on top of the built-in ignore set.
    pub ignore: Vec<String>,
    /// Use tree-sitter extraction. `false` forces fallback mode.
    pub structured_parsing: bool,
    /// Map import strings to project files before cycle detection.
    pub resolve_imports: bool,
    pub smells: SmellThresholds,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            ignore: Vec::new(),
            structured_parsing: true,
            resolve_imports: false,
            smells: SmellThresholds::default(),
        }
    }
}

/// Thresholds for the text heuristics in [`crate::metrics::smells`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmellThresholds {
    /// A method longer than this is a Long Method.
    pub long_method_lines: usize,
    /// Above this a Long Method is high severity.
    pub long_method_high: usize,
    /// A file longer than this is a Large File.
    pub large_file_lines: usize,
    /// Above this a Large File is high severity.
    pub large_file_high: usize,
    /// Lines after a function start used as its duplicate fingerprint.
    pub duplicate_window: usize,
    /// Shortest digit run reported as a magic number.
    pub magic_number_min_digits: usize,
}

impl Default for SmellThresholds {
    fn default() -> Self {
        Self {
            long_method_lines: 50,
            long_method_high: 100,
            large_file_lines: 500,
            large_file_high: 1000,
            duplicate_window: 20,
            magic_number_min_digits: 3,
        }
    }
}

impl ScopeConfig {
    /// Path of the config file for a project root.
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load config, falling back to defaults on a missing or broken file.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default config");
                Self::default()
            }
        }
    }

    /// Load config, reporting parse errors. A missing file yields defaults.
    pub fn try_load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                return Ok(Self::default());
            }
            Err(e) => return Err(ScopeError::read(path, e)),
        };
        toml::from_str(&content).map_err(|e| ScopeError::Config(e.to_string()))
    }

    /// Load the config belonging to a project root.
    pub fn for_project(root: &Path) -> Self {
        Self::load(&Self::path_for(root))
    }
}
