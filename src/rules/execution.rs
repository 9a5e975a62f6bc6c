//! Execution rules: shell commands, dynamic evaluation, decoded payload
//! execution, and binary/script launching.

use super::{
    extension, is_setup_call, RuleDescriptor, RuleHit, BINARY_EXTENSIONS, IMPLICIT_SHELL_FUNCS,
    SCRIPT_EXTENSIONS, SHELL_FUNCS,
};
use crate::engine::callsite::{is_constant, string_literal, CallSite};
use crate::types::{RuleCategory, Severity};
use tree_sitter::Node;

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "EXEC_SHELL_COMMAND",
        category: RuleCategory::Execution,
        brief: "Shell command execution (os.system, subprocess with shell=True)",
        check: shell_command,
    },
    RuleDescriptor {
        id: "EXEC_EVAL_DYNAMIC",
        category: RuleCategory::Execution,
        brief: "eval/exec/compile with dynamic content",
        check: eval_dynamic,
    },
    RuleDescriptor {
        id: "EXEC_HIDDEN_CODE",
        category: RuleCategory::Execution,
        brief: "Decoding a string and immediately executing it",
        check: hidden_code,
    },
    RuleDescriptor {
        id: "EXEC_DYNAMIC_IMPORT",
        category: RuleCategory::Execution,
        brief: "Dynamic module import (__import__, importlib)",
        check: dynamic_import,
    },
    RuleDescriptor {
        id: "EXEC_SETUP_CMDCLASS",
        category: RuleCategory::Execution,
        brief: "Custom install hook in setup() (cmdclass)",
        check: setup_cmdclass,
    },
    RuleDescriptor {
        id: "EXEC_BINARY_FILE",
        category: RuleCategory::Execution,
        brief: "Executing a native binary or making a file executable",
        check: binary_file,
    },
    RuleDescriptor {
        id: "EXEC_SCRIPT_FILE",
        category: RuleCategory::Execution,
        brief: "Executing a shell script file",
        check: script_file,
    },
];

fn shell_command(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !SHELL_FUNCS.contains(&callee) {
        return None;
    }

    if IMPLICIT_SHELL_FUNCS.contains(&callee) || site.kwarg_is_true("shell") {
        return Some(RuleHit::new(
            format!("Shell command execution detected via {callee}. This allows command injection."),
            Severity::Critical,
        ));
    }

    if callee.starts_with("subprocess.") {
        return Some(RuleHit::new(
            format!("Subprocess execution via {callee}. Verify arguments."),
            Severity::Warning,
        ));
    }

    None
}

fn eval_dynamic(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !matches!(callee, "eval" | "exec" | "compile") {
        return None;
    }

    // A string literal is still suspicious but at least auditable; anything
    // else is dynamic execution.
    let is_literal = site.arg_string(0).is_some();
    if is_literal {
        Some(RuleHit::new(
            format!("Dynamic code execution detected using {callee}()."),
            Severity::Warning,
        ))
    } else {
        Some(RuleHit::new(
            format!("Dynamic code execution detected using {callee}(). Argument appears to be dynamic."),
            Severity::Critical,
        ))
    }
}

fn hidden_code(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !matches!(callee, "exec" | "eval") {
        return None;
    }

    let arg0 = site.arg(0)?;
    if arg0.kind() != "call" {
        return None;
    }

    if let Some(inner) = site.nested_callee(arg0) {
        if inner.contains("decode") || inner.contains("unhexlify") || inner.contains("decompress") {
            return Some(RuleHit::new(
                format!("Execution of decoded/hidden code detected: {callee}({inner}(...))"),
                Severity::Critical,
            ));
        }
    }

    // exec("".join(...)) assembles code from fragments.
    let func = arg0.child_by_field_name("function")?;
    if func.kind() == "attribute" {
        let attr = func.child_by_field_name("attribute")?;
        if attr.utf8_text(site.source().as_bytes()).ok()? == "join" {
            return Some(RuleHit::new(
                format!("Execution of joined string detected: {callee}(join(...))"),
                Severity::Warning,
            ));
        }
    }

    None
}

fn dynamic_import(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !matches!(callee, "__import__" | "importlib.import_module") {
        return None;
    }

    if let Some(arg0) = site.arg(0) {
        if !is_constant(arg0) {
            return Some(RuleHit::new(
                format!(
                    "Dynamic module import detected: {callee}(variable). \
                     Module name is computed at runtime, may bypass static analysis."
                ),
                Severity::Warning,
            ));
        }

        if let Some(name) = site.arg_string(0) {
            let lower = name.to_lowercase();
            if ["download", "fetch", "temp", "tmp"]
                .iter()
                .any(|k| lower.contains(k))
            {
                return Some(RuleHit::new(
                    format!(
                        "Suspicious dynamic import: {callee}('{name}'). \
                         Module name suggests temporary or downloaded code."
                    ),
                    Severity::Warning,
                ));
            }
        }
    }

    Some(RuleHit::new(
        format!("Dynamic import detected ({callee})."),
        Severity::Warning,
    ))
}

fn setup_cmdclass(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !is_setup_call(callee) {
        return None;
    }
    site.kwarg("cmdclass")?;

    Some(RuleHit::new(
        "Custom install hook detected in setup() (cmdclass). Possible post-install execution.",
        Severity::Warning,
    ))
}

fn binary_file(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;

    if callee == "os.chmod" {
        if let Some(mode) = site.arg(1) {
            if let Some(value) = integer_literal(mode, site.source()) {
                // S_IXUSR
                if value & 0o100 != 0 {
                    return Some(RuleHit::new(
                        "Making file executable via os.chmod detected.",
                        Severity::Warning,
                    ));
                }
            }
        }
        return None;
    }

    let exec_funcs = [
        "os.startfile",
        "subprocess.Popen",
        "subprocess.run",
        "subprocess.call",
    ];
    if !exec_funcs.contains(&callee) {
        return None;
    }

    let target = site
        .arg_string(0)
        .or_else(|| site.arg(0).and_then(|a| first_list_string(a, site.source())))?;

    let ext = extension(&target)?;
    if BINARY_EXTENSIONS.contains(&ext.as_str()) {
        return Some(RuleHit::new(
            format!("Execution of binary file detected: {target}"),
            Severity::Critical,
        ));
    }

    None
}

fn script_file(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    let exec_funcs = [
        "subprocess.Popen",
        "subprocess.run",
        "subprocess.call",
        "os.system",
    ];
    if !exec_funcs.contains(&callee) {
        return None;
    }

    let command = site.arg_string(0).or_else(|| {
        site.arg(0).and_then(|a| {
            list_strings(a, site.source())
                .into_iter()
                .find(|s| extension(s).map_or(false, |e| SCRIPT_EXTENSIONS.contains(&e.as_str())))
        })
    })?;

    if let Some(ext) = extension(&command) {
        if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            return Some(RuleHit::new(
                format!("Execution of script file detected: {command}"),
                Severity::Critical,
            ));
        }
    }

    let lower = command.to_lowercase();
    let interpreter = lower
        .split_whitespace()
        .next()
        .map(|t| t.rsplit('/').next().unwrap_or(t))
        .map_or(false, |t| matches!(t, "bash" | "sh" | "zsh" | "powershell" | "cmd"));
    if interpreter || lower.contains("/bin/sh") || lower.contains("/bin/bash") {
        return Some(RuleHit::new(
            format!("Shell invocation detected: {command}"),
            Severity::Warning,
        ));
    }

    None
}

/// Parse a Python integer literal node (decimal, hex, octal, binary).
fn integer_literal(node: Node, source: &str) -> Option<u32> {
    if node.kind() != "integer" {
        return None;
    }
    let text = node.utf8_text(source.as_bytes()).ok()?;
    let text = text.replace('_', "");
    if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        u32::from_str_radix(rest, 8).ok()
    } else if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(rest, 16).ok()
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u32::from_str_radix(rest, 2).ok()
    } else {
        text.parse().ok()
    }
}

/// String value of the first element of a list literal, e.g. `["./run.sh"]`.
fn first_list_string(node: Node, source: &str) -> Option<String> {
    if node.kind() != "list" {
        return None;
    }
    let first = node.named_child(0)?;
    string_literal(first, source)
}

/// All string-literal elements of a list literal.
fn list_strings(node: Node, source: &str) -> Vec<String> {
    if node.kind() != "list" {
        return Vec::new();
    }
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter_map(|c| string_literal(c, source))
        .collect()
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
    fn os_system_is_critical() {
        let found = findings("import os\nos.system('ls')\n");
        assert!(has(&found, "EXEC_SHELL_COMMAND", Severity::Critical));
    }

    #[test]
    fn subprocess_with_shell_true_is_critical() {
        let found = findings("import subprocess\nsubprocess.run(cmd, shell=True)\n");
        assert!(has(&found, "EXEC_SHELL_COMMAND", Severity::Critical));
    }

    #[test]
    fn subprocess_without_shell_is_warning() {
        let found = findings("import subprocess\nsubprocess.run(['ls', '-l'])\n");
        assert!(has(&found, "EXEC_SHELL_COMMAND", Severity::Warning));
        assert!(!has(&found, "EXEC_SHELL_COMMAND", Severity::Critical));
    }

    #[test]
    fn eval_of_variable_is_critical() {
        let found = findings("eval(user_input)\n");
        assert!(has(&found, "EXEC_EVAL_DYNAMIC", Severity::Critical));
    }

    #[test]
    fn eval_of_literal_is_warning() {
        let found = findings("eval('1 + 1')\n");
        assert!(has(&found, "EXEC_EVAL_DYNAMIC", Severity::Warning));
    }

    #[test]
    fn exec_of_decoded_string_is_critical() {
        let found = findings("import base64\nexec(base64.b64decode(data))\n");
        assert!(has(&found, "EXEC_HIDDEN_CODE", Severity::Critical));
    }

    #[test]
    fn exec_of_joined_string_is_warning() {
        let found = findings("exec(''.join(parts))\n");
        assert!(has(&found, "EXEC_HIDDEN_CODE", Severity::Warning));
    }

    #[test]
    fn dynamic_import_of_variable_is_flagged() {
        let found = findings("import importlib\nimportlib.import_module(name)\n");
        assert!(has(&found, "EXEC_DYNAMIC_IMPORT", Severity::Warning));
    }

    #[test]
    fn cmdclass_hook_is_flagged() {
        let found = findings(
            "from setuptools import setup\nsetup(name='pkg', cmdclass={'install': Hook})\n",
        );
        assert!(has(&found, "EXEC_SETUP_CMDCLASS", Severity::Warning));
    }

    #[test]
    fn chmod_executable_bit_is_warning() {
        let found = findings("import os\nos.chmod('payload', 0o755)\n");
        assert!(has(&found, "EXEC_BINARY_FILE", Severity::Warning));
    }

    #[test]
    fn chmod_without_exec_bit_is_clean() {
        let found = findings("import os\nos.chmod('notes.txt', 0o644)\n");
        assert!(!found.iter().any(|f| f.rule_id == "EXEC_BINARY_FILE"));
    }

    #[test]
    fn launching_binary_is_critical() {
        let found = findings("import subprocess\nsubprocess.run(['./payload.exe'])\n");
        assert!(has(&found, "EXEC_BINARY_FILE", Severity::Critical));
    }

    #[test]
    fn script_execution_is_critical() {
        let found = findings("import subprocess\nsubprocess.call(['bash', 'evil.sh'])\n");
        assert!(has(&found, "EXEC_SCRIPT_FILE", Severity::Critical));
    }

    #[test]
    fn shell_invocation_string_is_warning() {
        let found = findings("import os\nos.system('bash -c something')\n");
        assert!(has(&found, "EXEC_SCRIPT_FILE", Severity::Warning));
    }
}
