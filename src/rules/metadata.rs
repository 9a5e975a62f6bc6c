//! Metadata rules: squatting checks and dependency anomalies on `setup()`
//! invocations.

use super::{is_setup_call, RuleDescriptor, RuleHit};
use crate::analysis::manifest::{validate_author, validate_description};
use crate::analysis::packages::ReferencePackages;
use crate::analysis::squatting::{check_combosquatting, check_typosquatting, TYPOSQUAT_THRESHOLD};
use crate::engine::callsite::{string_literal, CallSite};
use crate::types::{RuleCategory, Severity};

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "META_TYPOSQUATTING",
        category: RuleCategory::Metadata,
        brief: "Package name typosquats a popular package",
        check: typosquatting,
    },
    RuleDescriptor {
        id: "META_COMBOSQUATTING",
        category: RuleCategory::Metadata,
        brief: "Package name combines a popular package with an affix",
        check: combosquatting,
    },
    RuleDescriptor {
        id: "META_URL_DEPENDENCY",
        category: RuleCategory::Metadata,
        brief: "Direct URL dependency in install_requires",
        check: url_dependency,
    },
    RuleDescriptor {
        id: "META_DESCRIPTION_EMPTY",
        category: RuleCategory::Metadata,
        brief: "Missing or empty package description",
        check: description_empty,
    },
    RuleDescriptor {
        id: "META_DESCRIPTION_MISMATCH",
        category: RuleCategory::Metadata,
        brief: "Description too short or identical to the name",
        check: description_mismatch,
    },
    RuleDescriptor {
        id: "META_AUTHOR_SUSPICIOUS",
        category: RuleCategory::Metadata,
        brief: "Generic author name or throwaway email",
        check: author_suspicious,
    },
];

fn setup_name(site: &CallSite) -> Option<String> {
    let callee = site.callee()?;
    if !is_setup_call(callee) {
        return None;
    }
    site.kwarg_string("name")
}

fn typosquatting(site: &CallSite) -> Option<RuleHit> {
    let name = setup_name(site)?;
    let report = check_typosquatting(&name, ReferencePackages::builtin(), TYPOSQUAT_THRESHOLD);
    if !report.is_match {
        return None;
    }

    let similar: Vec<&str> = report.similar.iter().map(|s| s.name.as_str()).collect();
    let message = if report.homoglyphs.detected {
        format!(
            "Typosquatting detected: '{name}' uses confusable characters resembling {}.",
            report.homoglyphs.matches.join(", ")
        )
    } else {
        format!(
            "Typosquatting detected: '{name}' is similar to {}.",
            similar.join(", ")
        )
    };

    Some(RuleHit::new(message, report.severity))
}

fn combosquatting(site: &CallSite) -> Option<RuleHit> {
    let name = setup_name(site)?;
    let report = check_combosquatting(&name, ReferencePackages::builtin());
    if !report.is_match {
        return None;
    }

    let base = report.base_name.unwrap_or_default();
    Some(RuleHit::new(
        format!("Combosquatting detected: '{name}' uses popular package '{base}'."),
        Severity::Warning,
    ))
}

fn url_dependency(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !is_setup_call(callee) {
        return None;
    }

    let deps = site.kwarg("install_requires")?;
    if deps.kind() != "list" {
        return None;
    }

    let mut cursor = deps.walk();
    for entry in deps.named_children(&mut cursor) {
        if let Some(dep) = string_literal(entry, site.source()) {
            if dep.contains("http://") || dep.contains("https://") || dep.contains("git+") {
                return Some(RuleHit::new(
                    format!("Direct URL dependency detected: {dep}."),
                    Severity::Warning,
                ));
            }
        }
    }

    None
}

fn description_empty(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !is_setup_call(callee) {
        return None;
    }
    // Only meaningful once the call carries metadata at all.
    site.kwarg("name")?;

    let description = site.kwarg_string("description");
    let long_description = site.kwarg_string("long_description");
    let empty = |d: &Option<String>| d.as_deref().map_or(true, |s| s.trim().is_empty());

    if empty(&description) && empty(&long_description) {
        return Some(RuleHit::new(
            "Package has no description. Legitimate packages usually describe themselves.",
            Severity::Warning,
        ));
    }

    None
}

fn description_mismatch(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !is_setup_call(callee) {
        return None;
    }

    let description = site.kwarg_string("description")?;
    if description.trim().is_empty() {
        // The empty case belongs to META_DESCRIPTION_EMPTY.
        return None;
    }

    let name = site.kwarg_string("name").unwrap_or_default();
    let report = validate_description(&description, &name);
    if !report.is_suspicious() {
        return None;
    }

    Some(RuleHit::new(
        format!("Suspicious description: {}", report.issues.join(", ")),
        Severity::Info,
    ))
}

fn author_suspicious(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !is_setup_call(callee) {
        return None;
    }

    let author = site.kwarg_string("author").unwrap_or_default();
    let email = site.kwarg_string("author_email").unwrap_or_default();
    // Only meaningful once one of the fields is actually filled in.
    if author.is_empty() && email.is_empty() {
        return None;
    }

    let report = validate_author(&author, &email);
    if !report.is_suspicious() {
        return None;
    }

    Some(RuleHit::new(
        format!(
            "Suspicious author metadata detected: {}",
            report.issues.join(", ")
        ),
        report.severity,
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
    fn one_edit_from_requests_is_critical() {
        let found = findings(
            "from setuptools import setup\nsetup(name='requets', version='1.0', description='x')\n",
        );
        assert!(has(&found, "META_TYPOSQUATTING", Severity::Critical));
    }

    #[test]
    fn two_edits_is_warning() {
        let found = findings(
            "from setuptools import setup\nsetup(name='requtss', version='1.0', description='x')\n",
        );
        assert!(has(&found, "META_TYPOSQUATTING", Severity::Warning));
    }

    #[test]
    fn exact_popular_name_is_not_squatting() {
        let found = findings(
            "from setuptools import setup\nsetup(name='requests', version='1.0', description='x')\n",
        );
        assert!(!found.iter().any(|f| f.rule_id == "META_TYPOSQUATTING"));
    }

    #[test]
    fn suffix_combo_is_warning() {
        let found = findings(
            "from setuptools import setup\nsetup(name='requests-secure', version='1.0', description='x')\n",
        );
        assert!(has(&found, "META_COMBOSQUATTING", Severity::Warning));
    }

    #[test]
    fn git_url_dependency_is_warning() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='x', install_requires=['git+https://example.com/repo.git'])\n",
        );
        assert!(has(&found, "META_URL_DEPENDENCY", Severity::Warning));
    }

    #[test]
    fn pinned_dependency_is_clean() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='x', install_requires=['requests>=2.0'])\n",
        );
        assert!(!found.iter().any(|f| f.rule_id == "META_URL_DEPENDENCY"));
    }

    #[test]
    fn missing_description_is_warning() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', version='1.0')\n",
        );
        assert!(has(&found, "META_DESCRIPTION_EMPTY", Severity::Warning));
    }

    #[test]
    fn described_package_is_clean() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='a real tool')\n",
        );
        assert!(!found.iter().any(|f| f.rule_id == "META_DESCRIPTION_EMPTY"));
        assert!(!found.iter().any(|f| f.rule_id == "META_DESCRIPTION_MISMATCH"));
    }

    #[test]
    fn short_description_is_info() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='tiny')\n",
        );
        assert!(has(&found, "META_DESCRIPTION_MISMATCH", Severity::Info));
        assert!(!found.iter().any(|f| f.rule_id == "META_DESCRIPTION_EMPTY"));
    }

    #[test]
    fn description_copying_the_name_is_info() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool-plus', description='mytool-plus')\n",
        );
        assert!(has(&found, "META_DESCRIPTION_MISMATCH", Severity::Info));
    }

    #[test]
    fn generic_author_with_disposable_email_is_warning() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='a real tool', author='admin', author_email='drop@mailinator.com')\n",
        );
        assert!(has(&found, "META_AUTHOR_SUSPICIOUS", Severity::Warning));
    }

    #[test]
    fn generic_author_alone_still_fires() {
        // Generic name plus the missing email counts as two issues.
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='a real tool', author='test')\n",
        );
        assert!(has(&found, "META_AUTHOR_SUSPICIOUS", Severity::Warning));
    }

    #[test]
    fn named_author_is_clean() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='a real tool', author='Jane Doe', author_email='jane@example.com')\n",
        );
        assert!(!found.iter().any(|f| f.rule_id == "META_AUTHOR_SUSPICIOUS"));
    }

    #[test]
    fn setup_without_author_fields_is_silent() {
        let found = findings(
            "from setuptools import setup\nsetup(name='mytool', description='a real tool')\n",
        );
        assert!(!found.iter().any(|f| f.rule_id == "META_AUTHOR_SUSPICIOUS"));
    }
}
