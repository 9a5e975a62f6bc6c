//! Scanner configuration loaded from a `malscan.toml` file.

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// File-level scanner settings. Every field has a default so a partial (or
/// absent) config file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Findings below this severity are dropped from reports.
    pub min_severity: Severity,
    /// File extensions to scan, without the leading dot.
    pub extensions: Vec<String>,
    /// Directory names skipped while walking.
    pub exclude_dirs: Vec<String>,
    /// Whether text-pattern scanning runs in addition to the tree walk.
    pub text_patterns: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_severity: Severity::Info,
            extensions: vec!["py".to_string()],
            exclude_dirs: vec![
                ".git".to_string(),
                "__pycache__".to_string(),
                "venv".to_string(),
                ".venv".to_string(),
                "node_modules".to_string(),
                ".tox".to_string(),
            ],
            text_patterns: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// `malscan.toml` in the working directory when present, defaults
    /// otherwise.
    pub fn load_default() -> Self {
        let path = Path::new("malscan.toml");
        if path.exists() {
            Config::load(path).unwrap_or_default()
        } else {
            Config::default()
        }
    }

    /// Whether a file name's extension is in scope.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

/// Serialized defaults, written by `malscan init`.
pub fn generate_default_config() -> String {
    // Defaults always serialize.
    toml::to_string_pretty(&Config::default()).unwrap_or_default()
}
