//! Core data model: severities, verdicts, findings, and scan results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding, ordered so that `Critical` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    High,
    Critical,
}

impl Severity {
    /// Sort rank used by the aggregator: most severe first.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" | "crit" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Overall classification of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Danger,
    Safe,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Danger => f.write_str("DANGER"),
            Verdict::Safe => f.write_str("SAFE"),
        }
    }
}

/// Fixed rule categories. Registration order follows this enum's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Execution,
    Network,
    FileOps,
    Evasion,
    Exfiltration,
    Metadata,
    Installation,
    Recon,
}

impl RuleCategory {
    /// All categories in registration order.
    pub const ALL: [RuleCategory; 8] = [
        RuleCategory::Execution,
        RuleCategory::Network,
        RuleCategory::FileOps,
        RuleCategory::Evasion,
        RuleCategory::Exfiltration,
        RuleCategory::Metadata,
        RuleCategory::Installation,
        RuleCategory::Recon,
    ];
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleCategory::Execution => "execution",
            RuleCategory::Network => "network",
            RuleCategory::FileOps => "file_ops",
            RuleCategory::Evasion => "evasion",
            RuleCategory::Exfiltration => "exfiltration",
            RuleCategory::Metadata => "metadata",
            RuleCategory::Installation => "installation",
            RuleCategory::Recon => "recon",
        };
        f.write_str(s)
    }
}

/// One reported security indicator. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    /// 1-based source line.
    pub line: usize,
    /// 0-based column offset within the line.
    pub column: usize,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            line,
            column,
            message: message.into(),
            severity,
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Per-severity finding counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityStats {
    pub critical: usize,
    pub high: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityStats {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.warning + self.info
    }
}

/// Result of scanning one source text. Derived entirely from its findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
    pub stats: SeverityStats,
}

impl ScanResult {
    /// Highest severity present, if any finding exists.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn severity_rank_is_inverse_of_ordering() {
        assert_eq!(Severity::Critical.rank(), 0);
        assert_eq!(Severity::Info.rank(), 3);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("CRITICAL".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert!("bogus".parse::<Severity>().is_err());
    }

    #[test]
    fn finding_serializes_without_empty_snippet() {
        let f = Finding::new("EXEC_SHELL_COMMAND", 3, 0, "shell", Severity::Critical);
        let json = serde_json::to_string(&f).unwrap();
        assert!(!json.contains("snippet"));
        assert!(json.contains("\"severity\":\"CRITICAL\""));
    }
}
