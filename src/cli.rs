//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "malscan",
    about = "Static security scanner for Python packages",
    version
)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    pub format: String,

    /// Path to a config file (defaults to ./malscan.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a file or directory of Python sources
    Scan {
        /// File or directory to scan
        path: PathBuf,

        /// Drop findings below this severity
        #[arg(long)]
        min_severity: Option<String>,

        /// Exit non-zero if any finding is at or above this severity
        #[arg(long)]
        fail_on: Option<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the built-in detection rules
    Rules {
        /// Show one rule by id
        #[arg(long)]
        rule: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check a package name for typosquatting and combosquatting
    CheckName {
        /// The package name to check
        name: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    Init {
        /// Destination path
        #[arg(short, long, default_value = "malscan.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_parses_with_flags() {
        let cli = Cli::parse_from([
            "malscan",
            "scan",
            "pkg/",
            "--min-severity",
            "warning",
            "--fail-on",
            "critical",
        ]);
        match cli.command {
            Commands::Scan {
                path,
                min_severity,
                fail_on,
                ..
            } => {
                assert_eq!(path, PathBuf::from("pkg/"));
                assert_eq!(min_severity.as_deref(), Some("warning"));
                assert_eq!(fail_on.as_deref(), Some("critical"));
            }
            _ => panic!("expected scan subcommand"),
        }
    }
}
