//! Report rendering: colored text for terminals, JSON for machines.

use crate::engine::aggregate::summarize;
use crate::types::{ScanResult, Severity, SeverityStats, Verdict};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Scan outcome for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub result: ScanResult,
}

/// Everything one `scan` invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub verdict: Verdict,
    pub stats: SeverityStats,
    pub files: Vec<FileReport>,
}

impl Report {
    pub fn from_files(files: Vec<FileReport>) -> Self {
        let mut stats = SeverityStats::default();
        for file in &files {
            for finding in &file.result.findings {
                stats.record(finding.severity);
            }
        }
        let verdict = if files.iter().any(|f| f.result.verdict == Verdict::Danger) {
            Verdict::Danger
        } else {
            Verdict::Safe
        };
        Self {
            verdict,
            stats,
            files,
        }
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.files.iter().filter_map(|f| f.result.max_severity()).max()
    }
}

fn paint(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Critical => "CRITICAL".red().bold(),
        Severity::High => "HIGH".red(),
        Severity::Warning => "WARNING".yellow(),
        Severity::Info => "INFO".blue(),
    }
}

pub fn report(report: &Report, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => write_text(report, out)?,
    }
    Ok(())
}

fn write_text(rep: &Report, out: &mut dyn Write) -> anyhow::Result<()> {
    for file in &rep.files {
        if file.result.findings.is_empty() {
            continue;
        }

        writeln!(out, "{}", file.path.display().to_string().bold())?;
        for finding in &file.result.findings {
            writeln!(
                out,
                "  {}:{} [{}] {} {}",
                finding.line,
                finding.column,
                paint(finding.severity),
                finding.rule_id.dimmed(),
                finding.message
            )?;
            if let Some(snippet) = &finding.snippet {
                writeln!(out, "      {}", snippet.dimmed())?;
            }
        }

        let groups = summarize(&file.result.findings);
        if groups.len() > 1 {
            writeln!(out, "  {}", "by rule:".dimmed())?;
            for group in groups {
                writeln!(
                    out,
                    "    {:>3}x [{}] {}",
                    group.count,
                    paint(group.severity),
                    group.rule_id
                )?;
            }
        }
        writeln!(out)?;
    }

    let stats = &rep.stats;
    writeln!(
        out,
        "{} critical, {} high, {} warning, {} info across {} file(s)",
        stats.critical,
        stats.high,
        stats.warning,
        stats.info,
        rep.files.len()
    )?;

    let verdict = match rep.verdict {
        Verdict::Danger => "DANGER".red().bold(),
        Verdict::Safe => "SAFE".green().bold(),
    };
    writeln!(out, "verdict: {verdict}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::aggregate;
    use crate::types::Finding;

    fn sample_report() -> Report {
        let findings = vec![
            Finding::new("EXEC_SHELL_COMMAND", 3, 0, "shell command", Severity::Critical),
            Finding::new("FILE_WRITE_GENERIC", 7, 4, "file write", Severity::Info),
        ];
        Report::from_files(vec![FileReport {
            path: PathBuf::from("pkg/setup.py"),
            result: aggregate(findings),
        }])
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn json_report_has_expected_shape() {
        let rep = sample_report();
        let mut buf = Vec::new();
        report(&rep, OutputFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["verdict"], "DANGER");
        assert_eq!(value["stats"]["critical"], 1);
        let findings = value["files"][0]["findings"].as_array().unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0]["rule_id"], "EXEC_SHELL_COMMAND");
    }

    #[test]
    fn text_report_mentions_every_finding() {
        let rep = sample_report();
        let mut buf = Vec::new();
        report(&rep, OutputFormat::Text, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("pkg/setup.py"));
        assert!(text.contains("EXEC_SHELL_COMMAND"));
        assert!(text.contains("FILE_WRITE_GENERIC"));
        assert!(text.contains("verdict:"));
    }

    #[test]
    fn report_verdict_spans_files() {
        let safe = FileReport {
            path: PathBuf::from("a.py"),
            result: aggregate(vec![]),
        };
        let danger = FileReport {
            path: PathBuf::from("b.py"),
            result: aggregate(vec![Finding::new("X", 1, 0, "m", Severity::Critical)]),
        };
        let rep = Report::from_files(vec![safe, danger]);
        assert_eq!(rep.verdict, Verdict::Danger);
        assert_eq!(rep.max_severity(), Some(Severity::Critical));
    }
}
