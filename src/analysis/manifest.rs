//! Manifest field validation: author identity and description quality.

use crate::types::Severity;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Author names that carry no identity.
const GENERIC_AUTHOR_NAMES: &[&str] = &[
    "admin",
    "test",
    "user",
    "developer",
    "dev",
    "root",
    "author",
    "owner",
    "maintainer",
    "example",
    "demo",
];

/// Throwaway email providers seen on malicious uploads.
const DISPOSABLE_EMAIL_DOMAINS: &[&str] = &[
    "tempmail.com",
    "guerrillamail.com",
    "10minutemail.com",
    "mailinator.com",
    "throwaway.email",
    "temp-mail.org",
    "sharklasers.com",
    "guerrillamail.info",
];

const MIN_DESCRIPTION_LENGTH: usize = 10;

fn email_format_ok(email: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").ok())
        .as_ref()
        .map_or(true, |re| re.is_match(email))
}

/// Result of an author-field check.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorReport {
    pub issues: Vec<String>,
    pub severity: Severity,
}

impl AuthorReport {
    pub fn is_suspicious(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Check author name and email for the patterns throwaway uploads share:
/// generic names, malformed addresses, disposable providers, missing fields.
/// Severity scales with the number of issues found.
pub fn validate_author(author: &str, email: &str) -> AuthorReport {
    let mut issues = Vec::new();

    if author.is_empty() {
        issues.push("Missing author name".to_string());
    } else {
        let author_lower = author.trim().to_lowercase();
        if GENERIC_AUTHOR_NAMES.contains(&author_lower.as_str()) {
            issues.push(format!("Generic author name: '{author}'"));
        } else if author.chars().count() < 2 {
            issues.push("Very short author name".to_string());
        }
    }

    if email.is_empty() {
        issues.push("Missing author email".to_string());
    } else if !email_format_ok(email) {
        issues.push(format!("Invalid email format: '{email}'"));
    } else {
        let domain = email.rsplit('@').next().unwrap_or("").to_lowercase();
        if DISPOSABLE_EMAIL_DOMAINS.contains(&domain.as_str()) {
            issues.push(format!("Disposable email provider: {domain}"));
        }
    }

    let severity = match issues.len() {
        n if n >= 3 => Severity::Critical,
        2 => Severity::Warning,
        _ => Severity::Info,
    };

    AuthorReport { issues, severity }
}

/// Result of a description-quality check.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptionReport {
    pub issues: Vec<String>,
    pub severity: Severity,
}

impl DescriptionReport {
    pub fn is_suspicious(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Check a description against the package name: empty, too short to say
/// anything, or a bare copy of the name.
pub fn validate_description(description: &str, name: &str) -> DescriptionReport {
    let trimmed = description.trim();
    let mut issues = Vec::new();
    let mut severity = Severity::Info;

    if trimmed.is_empty() {
        issues.push("Empty description".to_string());
        severity = Severity::Warning;
    } else if trimmed.chars().count() < MIN_DESCRIPTION_LENGTH {
        issues.push(format!(
            "Very short description ({} chars)",
            description.chars().count()
        ));
        severity = Severity::Warning;
    } else if trimmed.to_lowercase() == name.to_lowercase() {
        issues.push("Description identical to package name".to_string());
        severity = Severity::Warning;
    }

    DescriptionReport { issues, severity }
}
