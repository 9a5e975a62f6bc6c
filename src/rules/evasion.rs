//! Evasion rules: payload decoding, process hiding, obfuscated dispatch,
//! error suppression, and high-entropy string detection.

use super::{RuleDescriptor, RuleHit};
use crate::analysis::entropy;
use crate::engine::callsite::CallSite;
use crate::types::{RuleCategory, Severity};

/// Decoding and decompression entry points used to unpack hidden payloads.
const DECODE_FUNCS: &[&str] = &[
    "base64.b64decode",
    "base64.standard_b64decode",
    "base64.urlsafe_b64decode",
    "binascii.a2b_base64",
    "zlib.decompress",
    "codecs.decode",
];

/// Constructors of symmetric ciphers commonly wrapped around payloads.
const CIPHER_FUNCS: &[&str] = &[
    "cryptography.fernet.Fernet",
    "Crypto.Cipher.AES.new",
    "Crypto.Cipher.DES.new",
    "nacl.secret.SecretBox",
];

/// Attribute names that hide a dangerous call behind `getattr`.
const DANGEROUS_ATTRS: &[&str] = &["system", "popen", "run", "call", "eval", "exec", "spawn"];

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "EVADE_BASE64_DECODE",
        category: RuleCategory::Evasion,
        brief: "Base64/zlib/codecs payload decoding",
        check: base64_decode,
    },
    RuleDescriptor {
        id: "EVADE_PROCESS_HIDE",
        category: RuleCategory::Evasion,
        brief: "Process name spoofing",
        check: process_hide,
    },
    RuleDescriptor {
        id: "EVADE_ENCRYPTED_PAYLOAD",
        category: RuleCategory::Evasion,
        brief: "Cipher construction or decryption",
        check: encrypted_payload,
    },
    RuleDescriptor {
        id: "EVADE_SUPPRESS_ERROR",
        category: RuleCategory::Evasion,
        brief: "Broad error suppression",
        check: suppress_error,
    },
    RuleDescriptor {
        id: "EVADE_SILENT_EXIT",
        category: RuleCategory::Evasion,
        brief: "Silent process exit",
        check: silent_exit,
    },
    RuleDescriptor {
        id: "EVADE_GETATTR_OBFUSCATION",
        category: RuleCategory::Evasion,
        brief: "Dangerous calls hidden behind getattr",
        check: getattr_obfuscation,
    },
    RuleDescriptor {
        id: "EVADE_DOCSTRING_EXEC",
        category: RuleCategory::Evasion,
        brief: "Code executed out of a docstring",
        check: docstring_exec,
    },
    RuleDescriptor {
        id: "EVADE_HIGH_ENTROPY_STRING",
        category: RuleCategory::Evasion,
        brief: "High-entropy or encoded-looking string arguments",
        check: high_entropy_string,
    },
];

fn base64_decode(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if DECODE_FUNCS.contains(&callee) {
        return Some(RuleHit::new(
            format!("Payload decoding detected via {callee}. Check decoded content."),
            Severity::Warning,
        ));
    }
    None
}

fn process_hide(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if callee == "setproctitle.setproctitle" || callee == "prctl.set_name" {
        return Some(RuleHit::new(
            format!("Process name spoofing detected via {callee}."),
            Severity::Critical,
        ));
    }
    None
}

fn encrypted_payload(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;

    if CIPHER_FUNCS.contains(&callee) {
        return Some(RuleHit::new(
            format!("Encryption library usage detected: {callee}."),
            Severity::Info,
        ));
    }

    // Any `.decrypt()` method call. Legitimate uses exist, so informational.
    if callee.ends_with(".decrypt") {
        return Some(RuleHit::new(
            "Decryption attempt detected (method '.decrypt()').",
            Severity::Info,
        ));
    }

    None
}

fn suppress_error(site: &CallSite) -> Option<RuleHit> {
    if site.callee()? == "contextlib.suppress" {
        return Some(RuleHit::new(
            "Explicit error suppression detected (contextlib.suppress).",
            Severity::Warning,
        ));
    }
    None
}

fn silent_exit(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if matches!(callee, "exit" | "quit" | "sys.exit" | "os._exit") {
        return Some(RuleHit::new(
            format!("System exit detected via {callee}()."),
            Severity::Warning,
        ));
    }
    None
}

fn getattr_obfuscation(site: &CallSite) -> Option<RuleHit> {
    if site.callee()? != "getattr" {
        return None;
    }
    let attr_arg = site.arg(1)?;

    if let Some(name) = site.arg_string(1) {
        if DANGEROUS_ATTRS.contains(&name.as_str()) {
            return Some(RuleHit::new(
                format!("Obfuscated call detected: getattr(..., '{name}')."),
                Severity::Critical,
            ));
        }
        return None;
    }

    // getattr(os, 'sys' + 'tem') style computed attribute names.
    if attr_arg.kind() == "binary_operator" {
        return Some(RuleHit::new(
            "Obfuscated attribute access (computed string).",
            Severity::Warning,
        ));
    }

    None
}

fn docstring_exec(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if callee != "exec" && callee != "eval" {
        return None;
    }
    let arg0 = site.arg(0)?;
    let source = site.source().as_bytes();

    let is_docstring = match arg0.kind() {
        "identifier" => arg0.utf8_text(source) == Ok("__doc__"),
        "attribute" => arg0
            .child_by_field_name("attribute")
            .map(|a| a.utf8_text(source) == Ok("__doc__"))
            .unwrap_or(false),
        _ => false,
    };

    if is_docstring {
        return Some(RuleHit::new(
            "Execution of docstring detected (exec of __doc__).",
            Severity::Critical,
        ));
    }

    None
}

fn high_entropy_string(site: &CallSite) -> Option<RuleHit> {
    for text in site.string_args() {
        if text.chars().count() < entropy::MIN_ANALYZED_LENGTH {
            continue;
        }
        if let Some(reason) = entropy::suspicion(&text) {
            return Some(RuleHit::new(
                format!("Suspicious string argument: {reason}."),
                Severity::Warning,
            ));
        }
    }
    None
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
    fn b64decode_is_warning() {
        let found = findings("import base64\nbase64.b64decode(data)\n");
        assert!(has(&found, "EVADE_BASE64_DECODE", Severity::Warning));
    }

    #[test]
    fn aliased_decode_is_still_caught() {
        let found = findings("from base64 import b64decode as d\nd(blob)\n");
        assert!(has(&found, "EVADE_BASE64_DECODE", Severity::Warning));
    }

    #[test]
    fn setproctitle_is_critical() {
        let found = findings("import setproctitle\nsetproctitle.setproctitle('[kworker]')\n");
        assert!(has(&found, "EVADE_PROCESS_HIDE", Severity::Critical));
    }

    #[test]
    fn fernet_construction_is_info() {
        let found = findings("from cryptography.fernet import Fernet\nf = Fernet(key)\n");
        assert!(has(&found, "EVADE_ENCRYPTED_PAYLOAD", Severity::Info));
    }

    #[test]
    fn decrypt_method_is_info() {
        let found = findings("plain = cipher.decrypt(blob)\n");
        assert!(has(&found, "EVADE_ENCRYPTED_PAYLOAD", Severity::Info));
    }

    #[test]
    fn contextlib_suppress_is_warning() {
        let found = findings("import contextlib\nwith contextlib.suppress(Exception):\n    pass\n");
        assert!(has(&found, "EVADE_SUPPRESS_ERROR", Severity::Warning));
    }

    #[test]
    fn sys_exit_is_warning() {
        let found = findings("import sys\nsys.exit(0)\n");
        assert!(has(&found, "EVADE_SILENT_EXIT", Severity::Warning));
    }

    #[test]
    fn getattr_with_system_is_critical() {
        let found = findings("import os\ngetattr(os, 'system')('id')\n");
        assert!(has(&found, "EVADE_GETATTR_OBFUSCATION", Severity::Critical));
    }

    #[test]
    fn getattr_with_computed_name_is_warning() {
        let found = findings("import os\ngetattr(os, 'sys' + 'tem')('id')\n");
        assert!(has(&found, "EVADE_GETATTR_OBFUSCATION", Severity::Warning));
    }

    #[test]
    fn getattr_with_benign_name_is_clean() {
        let found = findings("value = getattr(config, 'timeout')\n");
        assert!(!found
            .iter()
            .any(|f| f.rule_id == "EVADE_GETATTR_OBFUSCATION"));
    }

    #[test]
    fn exec_of_docstring_is_critical() {
        let found = findings("exec(__doc__)\n");
        assert!(has(&found, "EVADE_DOCSTRING_EXEC", Severity::Critical));
    }

    #[test]
    fn eval_of_module_docstring_attribute_is_critical() {
        let found = findings("import mod\neval(mod.__doc__)\n");
        assert!(has(&found, "EVADE_DOCSTRING_EXEC", Severity::Critical));
    }

    #[test]
    fn high_entropy_argument_is_warning() {
        // Random-looking base64 well past the length and entropy gates.
        let blob = "aGVsbG8K9fQ3xZ7pL2mNvB8kR5tY1wE6uI0oP4sDqX/cJhMnAl+VbKgTzWrYxOeSiUfC=";
        let source = format!("import base64\nbase64.b64decode('{blob}')\n");
        let found = findings(&source);
        assert!(found
            .iter()
            .any(|f| f.rule_id == "EVADE_HIGH_ENTROPY_STRING"));
    }

    #[test]
    fn plain_prose_is_not_high_entropy() {
        let found = findings("print('the quick brown fox jumps over the lazy dog again')\n");
        assert!(!found
            .iter()
            .any(|f| f.rule_id == "EVADE_HIGH_ENTROPY_STRING"));
    }
}
