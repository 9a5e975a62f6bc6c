//! Exfiltration rules: credential harvesting from the environment and the
//! channels used to ship data out (webhooks, paste sites, file uploads).

use super::{RuleDescriptor, RuleHit, HTTP_FUNCS};
use crate::engine::callsite::CallSite;
use crate::types::{RuleCategory, Severity};
use tree_sitter::Node;

/// Substrings of environment variable names that usually hold credentials.
const SENSITIVE_ENV_MARKERS: &[&str] = &["KEY", "SECRET", "TOKEN", "PASSWORD", "AWS", "AUTH"];

const WEBHOOK_HOSTS: &[&str] = &[
    "discord.com/api/webhooks",
    "discordapp.com/api/webhooks",
    "hooks.slack.com",
];

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "EXFIL_ENV_HARVEST",
        category: RuleCategory::Exfiltration,
        brief: "Reads of credential-bearing environment variables",
        check: env_harvest,
    },
    RuleDescriptor {
        id: "EXFIL_ENV_SEND",
        category: RuleCategory::Exfiltration,
        brief: "Environment variables passed to network calls",
        check: env_send,
    },
    RuleDescriptor {
        id: "EXFIL_FILE_UPLOAD",
        category: RuleCategory::Exfiltration,
        brief: "File uploads via requests files=",
        check: file_upload,
    },
    RuleDescriptor {
        id: "EXFIL_WEBHOOK",
        category: RuleCategory::Exfiltration,
        brief: "Discord/Slack webhook URLs in call arguments",
        check: webhook,
    },
    RuleDescriptor {
        id: "EXFIL_PASTEBIN",
        category: RuleCategory::Exfiltration,
        brief: "Network calls against paste sites",
        check: pastebin,
    },
];

fn env_harvest(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if callee != "os.environ.get" && callee != "os.getenv" {
        return None;
    }

    let key = site.arg_string(0)?.to_uppercase();
    if SENSITIVE_ENV_MARKERS.iter().any(|m| key.contains(m)) {
        return Some(RuleHit::new(
            format!("Access to sensitive environment variable detected ({key})."),
            Severity::Critical,
        ));
    }

    None
}

/// Whether an argument subtree mentions the process environment: a bare
/// `environ` identifier, an `.environ` attribute, or a `getenv` access.
fn mentions_environ(node: Node, source: &str) -> bool {
    match node.kind() {
        "identifier" => node.utf8_text(source.as_bytes()) == Ok("environ"),
        "attribute" => node
            .child_by_field_name("attribute")
            .and_then(|a| a.utf8_text(source.as_bytes()).ok())
            .map(|a| a == "environ" || a == "getenv")
            .unwrap_or(false),
        _ => false,
    }
}

fn env_send(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !HTTP_FUNCS.contains(&callee) {
        return None;
    }

    if site.any_arg_subtree(&mentions_environ) {
        return Some(RuleHit::new(
            format!("Environment variable exfiltration detected via {callee}."),
            Severity::Critical,
        ));
    }

    None
}

fn file_upload(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if matches!(callee, "requests.post" | "requests.put") && site.kwarg("files").is_some() {
        return Some(RuleHit::new(
            "File upload detected (requests with files=...). Possible exfiltration.",
            Severity::Warning,
        ));
    }
    None
}

fn webhook(site: &CallSite) -> Option<RuleHit> {
    for text in site.string_args() {
        for host in WEBHOOK_HOSTS {
            if text.contains(host) {
                return Some(RuleHit::new(
                    "Discord/Slack webhook detected. Common exfiltration channel.",
                    Severity::Critical,
                ));
            }
        }
    }
    None
}

fn pastebin(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !(callee.contains("requests") || callee.contains("urllib") || callee.contains("http")) {
        return None;
    }

    for text in site.string_args() {
        if text.contains("pastebin.com") || text.contains("hastebin.com") {
            return Some(RuleHit::new(
                "Connection to Pastebin/Hastebin detected. Possible exfiltration or payload host.",
                Severity::Warning,
            ));
        }
    }

    None
}
