//! Scan engine: one parse-and-walk pass plus an independent regex pass over
//! the raw text, merged into a single finding stream.

pub mod aggregate;
pub mod alias;
pub mod callsite;
pub mod regex_scan;
pub mod walker;

use crate::rules::RuleRegistry;
use crate::types::{Finding, ScanResult};
use self::regex_scan::TextPattern;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to compile text pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The analysis engine for one process: the shared rule registry plus the
/// compiled text patterns. Cheap to share by reference across scans.
pub struct Engine {
    registry: &'static RuleRegistry,
    patterns: Vec<TextPattern>,
}

impl Engine {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_text_patterns(true)
    }

    /// Engine with the regex pass toggled. With `false`, only the tree walk
    /// contributes findings.
    pub fn with_text_patterns(enabled: bool) -> Result<Self, EngineError> {
        let patterns = if enabled {
            regex_scan::builtin_patterns()?
        } else {
            Vec::new()
        };
        Ok(Self {
            registry: RuleRegistry::builtin(),
            patterns,
        })
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.registry
    }

    /// Both passes over one source text, merged and ordered by position.
    pub fn raw_findings(&self, source: &str) -> Vec<Finding> {
        let mut findings = walker::walk(source, self.registry);
        findings.extend(regex_scan::scan(source, &self.patterns));
        findings.sort_by(|a, b| {
            (a.line, a.column, a.rule_id.as_str()).cmp(&(b.line, b.column, b.rule_id.as_str()))
        });
        findings
    }

    /// Full scan of one source text: findings, stats, verdict.
    pub fn scan(&self, source: &str) -> ScanResult {
        aggregate::aggregate(self.raw_findings(source))
    }

    pub fn scan_file(&self, path: &Path) -> Result<ScanResult, EngineError> {
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.scan(&source))
    }
}
