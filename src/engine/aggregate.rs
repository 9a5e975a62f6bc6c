//! Finding aggregation: verdicts, per-severity stats, and grouped summaries.

use crate::types::{Finding, ScanResult, Severity, SeverityStats, Verdict};
use serde::Serialize;

/// Pure reduction from findings to a scan result. Identical findings always
/// yield an identical result.
pub fn aggregate(findings: Vec<Finding>) -> ScanResult {
    let mut stats = SeverityStats::default();
    for finding in &findings {
        stats.record(finding.severity);
    }

    let verdict = if findings
        .iter()
        .any(|f| f.severity >= Severity::High)
    {
        Verdict::Danger
    } else {
        Verdict::Safe
    };

    ScanResult {
        verdict,
        findings,
        stats,
    }
}

/// One rule's findings collapsed for summary views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleGroup {
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
    pub count: usize,
}

/// Group findings by rule id and sort by `(severity_rank, -count, rule_id)`
/// so the most severe, most frequent issues come first. The rule-id tiebreak
/// keeps output deterministic.
pub fn summarize(findings: &[Finding]) -> Vec<RuleGroup> {
    let mut groups: Vec<RuleGroup> = Vec::new();

    for finding in findings {
        match groups.iter_mut().find(|g| g.rule_id == finding.rule_id) {
            Some(group) => {
                group.count += 1;
                group.severity = group.severity.max(finding.severity);
            }
            None => groups.push(RuleGroup {
                rule_id: finding.rule_id.clone(),
                message: finding.message.clone(),
                severity: finding.severity,
                count: 1,
            }),
        }
    }

    groups.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then(b.count.cmp(&a.count))
            .then(a.rule_id.cmp(&b.rule_id))
    });

    groups
}
