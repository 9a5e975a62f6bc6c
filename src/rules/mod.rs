//! Detection rules and the process-wide rule registry.
//!
//! Every rule conforms to one dispatch contract: given a call site and the
//! alias context it carries, return at most one hit. Rules never mutate
//! shared state and never see nodes outside the call expression subtree.

mod evasion;
mod execution;
mod exfiltration;
mod file_ops;
mod installation;
mod metadata;
mod network;
mod recon;

use crate::engine::callsite::CallSite;
use crate::types::{RuleCategory, Severity};
use std::sync::OnceLock;

/// Outcome of one rule matching one call site. The dispatcher attaches the
/// rule id and source position.
#[derive(Debug, Clone)]
pub struct RuleHit {
    pub message: String,
    pub severity: Severity,
}

impl RuleHit {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// A rule's check function: pure, at most one hit per call site.
pub type RuleCheck = fn(&CallSite) -> Option<RuleHit>;

/// One registered detection heuristic.
#[derive(Debug, Clone, Copy)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub category: RuleCategory,
    /// One-line summary shown by `malscan rules`.
    pub brief: &'static str,
    pub check: RuleCheck,
}

/// Immutable collection of all rules, grouped by category, built once per
/// process. Reloading would replace the whole structure, never mutate rules
/// in place.
#[derive(Debug)]
pub struct RuleRegistry {
    rules: Vec<RuleDescriptor>,
}

impl RuleRegistry {
    /// The built-in registry, constructed on first use.
    pub fn builtin() -> &'static RuleRegistry {
        static REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();
        REGISTRY.get_or_init(RuleRegistry::build)
    }

    /// Concatenate per-category tables in fixed category order so output
    /// ordering is deterministic.
    fn build() -> Self {
        let mut rules = Vec::new();
        for category in RuleCategory::ALL {
            rules.extend_from_slice(match category {
                RuleCategory::Execution => execution::RULES,
                RuleCategory::Network => network::RULES,
                RuleCategory::FileOps => file_ops::RULES,
                RuleCategory::Evasion => evasion::RULES,
                RuleCategory::Exfiltration => exfiltration::RULES,
                RuleCategory::Metadata => metadata::RULES,
                RuleCategory::Installation => installation::RULES,
                RuleCategory::Recon => recon::RULES,
            });
        }
        Self { rules }
    }

    pub fn rules(&self) -> &[RuleDescriptor] {
        &self.rules
    }

    pub fn for_category(&self, category: RuleCategory) -> impl Iterator<Item = &RuleDescriptor> {
        self.rules.iter().filter(move |r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// Target sets shared across categories, hoisted here so each rule consults
// one immutable table instead of rebuilding its own.

/// Functions that hand a command line to the operating system.
pub(crate) const SHELL_FUNCS: &[&str] = &[
    "os.system",
    "os.popen",
    "subprocess.call",
    "subprocess.check_call",
    "subprocess.check_output",
    "subprocess.run",
    "subprocess.Popen",
    "commands.getoutput",
    "commands.getstatusoutput",
];

/// Functions that always route through a shell regardless of arguments.
pub(crate) const IMPLICIT_SHELL_FUNCS: &[&str] = &[
    "os.system",
    "os.popen",
    "commands.getoutput",
    "commands.getstatusoutput",
];

/// Whether a callee is a `setup()` invocation from setuptools/distutils.
pub(crate) fn is_setup_call(name: &str) -> bool {
    name == "setup" || name.ends_with(".setup")
}

/// Common outbound HTTP entry points.
pub(crate) const HTTP_FUNCS: &[&str] = &[
    "requests.get",
    "requests.post",
    "requests.put",
    "requests.patch",
    "requests.delete",
    "requests.request",
    "urllib.request.urlopen",
    "urllib.request.urlretrieve",
    "http.client.HTTPConnection",
    "http.client.HTTPSConnection",
];

/// File extensions of native executables.
pub(crate) const BINARY_EXTENSIONS: &[&str] = &[".exe", ".elf", ".bin", ".dll", ".so"];

/// File extensions of shell scripts.
pub(crate) const SCRIPT_EXTENSIONS: &[&str] = &[".sh", ".bat", ".ps1", ".cmd"];

/// Lowercased extension of a path-like string, including the dot.
pub(crate) fn extension(path: &str) -> Option<String> {
    let name = path.rsplit(['/', '\\']).next()?;
    let dot = name.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some(name[dot..].to_lowercase())
}
