//! Reconnaissance rules: system fingerprinting, directory enumeration, and
//! credential file reads.

use super::{RuleDescriptor, RuleHit};
use crate::engine::callsite::CallSite;
use crate::types::{RuleCategory, Severity};

const FINGERPRINT_FUNCS: &[&str] = &[
    "platform.system",
    "platform.release",
    "platform.version",
    "platform.machine",
    "os.uname",
];

const ENUM_FUNCS: &[&str] = &["os.listdir", "os.walk", "glob.glob", "glob.iglob"];

/// Files whose mere read is a credential-theft indicator.
const SENSITIVE_FILES: &[&str] = &[
    "/etc/passwd",
    "/etc/shadow",
    ".ssh/id_rsa",
    ".aws/credentials",
    ".bash_history",
    "config.json",
    "secrets.yaml",
    ".env",
];

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "RECON_SYSTEM_FINGERPRINT",
        category: RuleCategory::Recon,
        brief: "OS and platform fingerprinting",
        check: system_fingerprint,
    },
    RuleDescriptor {
        id: "RECON_DIRECTORY_ENUM",
        category: RuleCategory::Recon,
        brief: "Directory enumeration",
        check: directory_enum,
    },
    RuleDescriptor {
        id: "RECON_SENSITIVE_READ",
        category: RuleCategory::Recon,
        brief: "Reads of credential files",
        check: sensitive_read,
    },
];

fn system_fingerprint(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if FINGERPRINT_FUNCS.contains(&callee) {
        return Some(RuleHit::new(
            format!("System fingerprinting detected via {callee}."),
            Severity::Info,
        ));
    }
    None
}

fn directory_enum(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if ENUM_FUNCS.contains(&callee) {
        return Some(RuleHit::new(
            format!("Directory enumeration detected via {callee}."),
            Severity::Warning,
        ));
    }
    None
}

fn sensitive_read(site: &CallSite) -> Option<RuleHit> {
    if site.callee()? != "open" {
        return None;
    }
    let path = site.arg_string(0)?;
    if !SENSITIVE_FILES.iter().any(|t| path.contains(t)) {
        return None;
    }

    // Default mode is 'r'; only an explicit write mode clears the read flag.
    let mode = site
        .arg_string(1)
        .or_else(|| site.kwarg_string("mode"))
        .unwrap_or_else(|| "r".to_string());
    if mode.contains('w') || mode.contains('a') {
        return None;
    }

    Some(RuleHit::new(
        format!("Reading sensitive file detected: {path}"),
        Severity::Critical,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::walker::walk;
    use crate::rules::RuleRegistry;
    use crate::types::Finding;

    fn findings(source: &str) -> Vec<Finding> {
        walk(source, RuleRegistry::builtin())
    }

    fn has(findings: &[Finding], rule_id: &str, severity: Severity) -> bool {
        findings
            .iter()
            .any(|f| f.rule_id == rule_id && f.severity == severity)
    }

    #[test]
    fn platform_system_is_info() {
        let found = findings("import platform\nplatform.system()\n");
        assert!(has(&found, "RECON_SYSTEM_FINGERPRINT", Severity::Info));
    }

    #[test]
    fn os_walk_is_warning() {
        let found = findings("import os\nfor root, dirs, files in os.walk('/home'):\n    pass\n");
        assert!(has(&found, "RECON_DIRECTORY_ENUM", Severity::Warning));
    }

    #[test]
    fn reading_ssh_key_is_critical() {
        let found = findings("key = open('/home/u/.ssh/id_rsa').read()\n");
        assert!(has(&found, "RECON_SENSITIVE_READ", Severity::Critical));
    }

    #[test]
    fn reading_dotenv_is_critical() {
        let found = findings("conf = open('.env', 'r').read()\n");
        assert!(has(&found, "RECON_SENSITIVE_READ", Severity::Critical));
    }

    #[test]
    fn writing_config_is_not_a_recon_read() {
        let found = findings("open('config.json', 'w').write(data)\n");
        assert!(!found.iter().any(|f| f.rule_id == "RECON_SENSITIVE_READ"));
    }
}
