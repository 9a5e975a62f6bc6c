//! Regex-based text scanner, independent of the tree walker.
//!
//! Catches indicators that survive in comments, docstrings, and files the
//! parser cannot see into: hardcoded IPs, escape-sequence blobs, webhook and
//! paste-site URLs.

use crate::types::{Finding, Severity};
use regex::Regex;

/// Snippets are truncated to this many characters.
const SNIPPET_LIMIT: usize = 100;

/// One compiled text pattern.
#[derive(Debug)]
pub struct TextPattern {
    pub id: &'static str,
    pub message: &'static str,
    pub severity: Severity,
    pub regex: Regex,
}

/// Compile the built-in pattern set. Compilation failure is fatal here, at
/// construction time, never during an individual scan.
pub fn builtin_patterns() -> Result<Vec<TextPattern>, regex::Error> {
    let table: &[(&str, &str, Severity, &str)] = &[
        (
            "TEXT_IPV4_LITERAL",
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
            Severity::Info,
            "Hardcoded IPv4 address detected.",
        ),
        (
            "TEXT_HEX_ESCAPE_BLOB",
            r"(\\x[0-9a-fA-F]{2}){10,}",
            Severity::Warning,
            "Long sequence of hex escapes detected. Possible shellcode or obfuscation.",
        ),
        (
            "TEXT_WEBHOOK_URL",
            r"https://(?:discord(?:app)?\.com/api/webhooks|hooks\.slack\.com)/\S+",
            Severity::Critical,
            "Chat-service webhook URL detected. Common exfiltration channel.",
        ),
        (
            "TEXT_PASTE_SITE_URL",
            r"https?://(?:pastebin\.com|hastebin\.com|paste\.ee)/\S+",
            Severity::Warning,
            "Paste-site URL detected. Possible payload host or exfiltration target.",
        ),
        (
            "TEXT_BASE64_BLOB",
            r"[A-Za-z0-9+/]{120,}={0,2}",
            Severity::Warning,
            "Long base64-like blob detected. Possible embedded payload.",
        ),
    ];

    table
        .iter()
        .map(|(id, pattern, severity, message)| {
            Ok(TextPattern {
                id,
                message,
                severity: *severity,
                regex: Regex::new(pattern)?,
            })
        })
        .collect()
}

/// Apply every pattern to `text`, emitting one finding per non-overlapping
/// match, not just the first match per pattern.
pub fn scan(text: &str, patterns: &[TextPattern]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for pattern in patterns {
        for m in pattern.regex.find_iter(text) {
            let preceding = &text[..m.start()];
            let line = preceding.matches('\n').count() + 1;
            let column = m.start() - preceding.rfind('\n').map_or(0, |i| i + 1);
            let snippet: String = m.as_str().chars().take(SNIPPET_LIMIT).collect();

            findings.push(
                Finding::new(pattern.id, line, column, pattern.message, pattern.severity)
                    .with_snippet(snippet),
            );
        }
    }

    findings
}
