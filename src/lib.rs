//! malscan: static security analysis for Python packages.
//!
//! The engine parses each source file with tree-sitter, walks the tree once
//! while tracking import aliases, and runs every registered detection rule at
//! each call expression. A separate regex pass catches indicators living in
//! comments and string blobs. Findings from both passes are aggregated into a
//! verdict.
//!
//! ```no_run
//! use malscan::Engine;
//!
//! let engine = Engine::new()?;
//! let result = engine.scan("import os\nos.system('id')\n");
//! assert_eq!(result.verdict, malscan::Verdict::Danger);
//! # Ok::<(), malscan::EngineError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod report;
pub mod rules;
pub mod types;

pub use config::{generate_default_config, Config};
pub use engine::{Engine, EngineError};
pub use rules::{RuleDescriptor, RuleRegistry};
pub use types::{Finding, RuleCategory, ScanResult, Severity, SeverityStats, Verdict};
