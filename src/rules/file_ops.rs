//! File operation rules: sensitive reads and writes, destructive deletion,
//! persistence via startup files, and PATH hijacking.

use super::{RuleDescriptor, RuleHit};
use crate::engine::callsite::CallSite;
use crate::types::{RuleCategory, Severity};

/// Files whose contents are credentials or system account data.
const SENSITIVE_READ_PATHS: &[&str] = &[
    "/etc/shadow",
    "/etc/passwd",
    "/etc/hosts",
    ".ssh/id_rsa",
    ".aws/credentials",
    ".bashrc",
    ".zshrc",
    "/etc/cron.d",
    "/etc/init.d",
];

/// Locations a package has no business writing into.
const SENSITIVE_WRITE_PATHS: &[&str] = &[
    "/etc", "/var/run", "/var/log", ".ssh", ".bashrc", ".profile", "/boot", "/proc", "/sys",
    "/root",
];

/// Files executed on login or boot, the usual persistence targets.
const STARTUP_FILES: &[&str] = &[
    ".bashrc",
    ".bash_profile",
    ".zshrc",
    ".profile",
    "/etc/rc.local",
    "systemd",
    "init.d",
    "autostart",
];

const DELETE_FUNCS: &[&str] = &["os.remove", "os.unlink", "shutil.rmtree", "os.rmdir"];

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "FILE_SENSITIVE_READ",
        category: RuleCategory::FileOps,
        brief: "Access to credential and system account files",
        check: sensitive_read,
    },
    RuleDescriptor {
        id: "FILE_WRITE_GENERIC",
        category: RuleCategory::FileOps,
        brief: "File opened for writing",
        check: write_generic,
    },
    RuleDescriptor {
        id: "FILE_WRITE_SENSITIVE",
        category: RuleCategory::FileOps,
        brief: "Write into a sensitive system location",
        check: write_sensitive,
    },
    RuleDescriptor {
        id: "FILE_DELETE",
        category: RuleCategory::FileOps,
        brief: "File deletion, destructive or self-erasing",
        check: delete,
    },
    RuleDescriptor {
        id: "FILE_STARTUP_MODIFY",
        category: RuleCategory::FileOps,
        brief: "Startup file modified for persistence",
        check: startup_modify,
    },
    RuleDescriptor {
        id: "FILE_ENV_HIJACK",
        category: RuleCategory::FileOps,
        brief: "PATH or environment modification",
        check: env_hijack,
    },
];

/// Whether an `open()` call site requests a write mode, either positionally
/// or via `mode=`.
fn opens_for_write(site: &CallSite) -> bool {
    let mode = site
        .arg_string(1)
        .or_else(|| site.kwarg_string("mode"));
    match mode {
        Some(m) => m.contains('w') || m.contains('a') || m.contains('+'),
        None => false,
    }
}

fn sensitive_read(site: &CallSite) -> Option<RuleHit> {
    if site.callee()? != "open" {
        return None;
    }
    let path = site.arg_string(0)?;
    if SENSITIVE_READ_PATHS.iter().any(|t| path.contains(t)) && !opens_for_write(site) {
        return Some(RuleHit::new(
            format!("Sensitive file access detected: {path}"),
            Severity::Critical,
        ));
    }
    None
}

fn write_generic(site: &CallSite) -> Option<RuleHit> {
    if site.callee()? == "open" && opens_for_write(site) {
        return Some(RuleHit::new(
            "File write operation detected.",
            Severity::Info,
        ));
    }
    None
}

fn write_sensitive(site: &CallSite) -> Option<RuleHit> {
    if site.callee()? != "open" {
        return None;
    }
    let path = site.arg_string(0)?;
    if SENSITIVE_WRITE_PATHS.iter().any(|t| path.contains(t)) && opens_for_write(site) {
        return Some(RuleHit::new(
            format!("Writing to sensitive file location detected: {path}"),
            Severity::Critical,
        ));
    }
    None
}

fn delete(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !DELETE_FUNCS.contains(&callee) {
        return None;
    }

    if let Some(path) = site.arg_string(0) {
        if path == "/" || path == "C:\\" || path == "." {
            return Some(RuleHit::new(
                format!("Destructive file deletion detected on root/cwd: {path}"),
                Severity::Critical,
            ));
        }
    } else if let Some(arg0) = site.arg(0) {
        if arg0.kind() == "identifier"
            && arg0.utf8_text(site.source().as_bytes()) == Ok("__file__")
        {
            return Some(RuleHit::new(
                "Self-deletion detected (removing __file__).",
                Severity::Warning,
            ));
        }
    }

    Some(RuleHit::new(
        format!("File deletion detected via {callee}."),
        Severity::Warning,
    ))
}

fn startup_modify(site: &CallSite) -> Option<RuleHit> {
    if site.callee()? != "open" {
        return None;
    }
    let path = site.arg_string(0)?;
    if STARTUP_FILES.iter().any(|s| path.contains(s)) && opens_for_write(site) {
        return Some(RuleHit::new(
            format!("Persistence attempt detected: modifying startup file {path}."),
            Severity::Critical,
        ));
    }
    None
}

fn env_hijack(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;

    if callee == "os.putenv" && site.arg_string(0).as_deref() == Some("PATH") {
        return Some(RuleHit::new(
            "PATH environment variable modification detected (os.putenv).",
            Severity::Critical,
        ));
    }

    if callee == "os.environ.update" {
        return Some(RuleHit::new(
            "Environment variable modification detected (os.environ.update).",
            Severity::Warning,
        ));
    }

    None
}
