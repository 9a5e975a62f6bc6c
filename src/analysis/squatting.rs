//! Package-name squatting detection: typosquatting (edit distance),
//! homoglyph substitution, and combosquatting (affix patterns).

use super::packages::ReferencePackages;
use crate::types::Severity;
use serde::Serialize;

/// Default maximum edit distance treated as a typosquatting match.
pub const TYPOSQUAT_THRESHOLD: usize = 2;

/// Visually-confusable characters mapped to their Latin equivalents.
/// Cyrillic, Greek, and fullwidth look-alikes cover the attacks seen in the
/// wild on package registries.
const HOMOGLYPHS: &[(char, char)] = &[
    // Cyrillic
    ('\u{0430}', 'a'),
    ('\u{0435}', 'e'),
    ('\u{043e}', 'o'),
    ('\u{0440}', 'p'),
    ('\u{0441}', 'c'),
    ('\u{0443}', 'y'),
    ('\u{0445}', 'x'),
    // Greek
    ('\u{03bf}', 'o'),
    ('\u{03bd}', 'v'),
    ('\u{03b1}', 'a'),
    // Fullwidth
    ('\u{ff10}', '0'),
    ('\u{ff11}', '1'),
    ('\u{ff2f}', 'O'),
    ('\u{ff29}', 'I'),
];

/// Affixes commonly glued onto a legitimate name by combosquatters.
const COMBO_AFFIXES: &[&str] = &[
    "-", "_", "v2", "2", "py", "python", "helper", "utils", "tool", "tools",
    "lib", "library", "secure", "safe", "plus", "extended", "pro",
];

/// Classic Levenshtein edit distance, row-at-a-time dynamic programming.
/// Symmetric: `levenshtein(a, b) == levenshtein(b, a)`.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, &ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// A reference package within edit distance of the checked name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarPackage {
    pub name: String,
    pub distance: usize,
}

/// Result of a typosquatting check.
#[derive(Debug, Clone, Serialize)]
pub struct TyposquatReport {
    pub is_match: bool,
    pub similar: Vec<SimilarPackage>,
    pub min_distance: Option<usize>,
    pub homoglyphs: HomoglyphReport,
    pub severity: Severity,
}

/// Compare `name` against every reference entry, collecting entries within
/// `threshold` edit distance. Exact matches are skipped: a package that *is*
/// `requests` is not squatting on it.
pub fn check_typosquatting(
    name: &str,
    references: &ReferencePackages,
    threshold: usize,
) -> TyposquatReport {
    let name_lower = name.to_lowercase();

    let mut similar = Vec::new();
    let mut min_distance: Option<usize> = None;

    for reference in references.names() {
        let reference_lower = reference.to_lowercase();
        if name_lower == reference_lower {
            continue;
        }

        let distance = levenshtein(&name_lower, &reference_lower);
        if distance <= threshold {
            min_distance = Some(min_distance.map_or(distance, |m| m.min(distance)));
            similar.push(SimilarPackage {
                name: reference.clone(),
                distance,
            });
        }
    }

    let homoglyphs = check_homoglyphs(name, references);
    let is_match = !similar.is_empty() || homoglyphs.detected;

    let severity = if min_distance == Some(1) || homoglyphs.detected {
        Severity::Critical
    } else if min_distance == Some(2) {
        Severity::Warning
    } else {
        Severity::Info
    };

    TyposquatReport {
        is_match,
        similar,
        min_distance,
        homoglyphs,
        severity,
    }
}

/// Result of a homoglyph check.
#[derive(Debug, Clone, Serialize)]
pub struct HomoglyphReport {
    /// True when confusable characters were found and the normalized name
    /// equals a reference entry.
    pub detected: bool,
    /// The confusable characters present in the name.
    pub characters: Vec<char>,
    /// Reference entries the normalized name matches.
    pub matches: Vec<String>,
}

/// Substitute known confusable characters with their Latin equivalents, then
/// test the normalized form against the reference list case-insensitively.
pub fn check_homoglyphs(name: &str, references: &ReferencePackages) -> HomoglyphReport {
    let mut characters = Vec::new();
    let normalized: String = name
        .chars()
        .map(|c| {
            match HOMOGLYPHS.iter().find(|(from, _)| *from == c) {
                Some(&(_, to)) => {
                    characters.push(c);
                    to
                }
                None => c,
            }
        })
        .collect();

    let matches: Vec<String> = if characters.is_empty() {
        Vec::new()
    } else {
        references
            .names()
            .iter()
            .filter(|r| r.eq_ignore_ascii_case(&normalized))
            .cloned()
            .collect()
    };

    HomoglyphReport {
        detected: !matches.is_empty(),
        characters,
        matches,
    }
}

/// Where the squatter's addition sits relative to the legitimate base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComboPattern {
    /// Addition precedes the base name, e.g. `py-requests`.
    Prefix,
    /// Addition follows the base name, e.g. `requests-secure`.
    Suffix,
}

/// Result of a combosquatting check.
#[derive(Debug, Clone, Serialize)]
pub struct ComboReport {
    pub is_match: bool,
    pub base_name: Option<String>,
    pub pattern: Option<ComboPattern>,
    pub addition: Option<String>,
}

impl ComboReport {
    fn none() -> Self {
        Self {
            is_match: false,
            base_name: None,
            pattern: None,
            addition: None,
        }
    }
}

/// Detect a known reference name concatenated with a common affix. A name
/// exactly equal to a reference entry is never a match.
pub fn check_combosquatting(name: &str, references: &ReferencePackages) -> ComboReport {
    let name_lower = name.to_lowercase();

    for reference in references.names() {
        let reference_lower = reference.to_lowercase();
        if name_lower == reference_lower || !name_lower.contains(&reference_lower) {
            continue;
        }

        if name_lower.starts_with(&reference_lower) {
            let addition = &name_lower[reference_lower.len()..];
            if COMBO_AFFIXES
                .iter()
                .any(|a| addition.starts_with(a) || addition == *a)
            {
                return ComboReport {
                    is_match: true,
                    base_name: Some(reference.clone()),
                    pattern: Some(ComboPattern::Suffix),
                    addition: Some(addition.to_string()),
                };
            }
        }

        if name_lower.ends_with(&reference_lower) {
            let addition = &name_lower[..name_lower.len() - reference_lower.len()];
            if COMBO_AFFIXES
                .iter()
                .any(|a| addition.ends_with(a) || addition == *a)
            {
                return ComboReport {
                    is_match: true,
                    base_name: Some(reference.clone()),
                    pattern: Some(ComboPattern::Prefix),
                    addition: Some(addition.to_string()),
                };
            }
        }
    }

    ComboReport::none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(names: &[&str]) -> ReferencePackages {
        ReferencePackages::new(names.iter().map(|s| s.to_string()))
    }

    #[test]
    fn levenshtein_known_distances() {
        assert_eq!(levenshtein("requests", "requests"), 0);
        assert_eq!(levenshtein("requests", "requets"), 2);
        assert_eq!(levenshtein("numpy", "nunpy"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn levenshtein_is_symmetric() {
        for (a, b) in [
            ("requests", "requets"),
            ("numpy", "nunpy"),
            ("kitten", "sitting"),
            ("", "pandas"),
        ] {
            assert_eq!(levenshtein(a, b), levenshtein(b, a));
        }
    }

    #[test]
    fn typosquat_distance_one_is_critical() {
        let report = check_typosquatting("nunpy", &refs(&["numpy"]), TYPOSQUAT_THRESHOLD);
        assert!(report.is_match);
        assert_eq!(report.min_distance, Some(1));
        assert_eq!(report.severity, Severity::Critical);
    }

    #[test]
    fn typosquat_distance_two_is_warning() {
        let report = check_typosquatting("reqeusts", &refs(&["requests"]), TYPOSQUAT_THRESHOLD);
        assert!(report.is_match);
        assert_eq!(report.min_distance, Some(2));
        assert_eq!(report.severity, Severity::Warning);
    }

    #[test]
    fn exact_match_is_not_typosquatting() {
        let report = check_typosquatting("requests", &refs(&["requests"]), TYPOSQUAT_THRESHOLD);
        assert!(!report.is_match);
        assert_eq!(report.min_distance, None);
    }

    #[test]
    fn homoglyph_cyrillic_a_matches() {
        // "p\u{0430}ndas" uses Cyrillic а in place of Latin a.
        let report = check_homoglyphs("p\u{0430}ndas", &refs(&["pandas"]));
        assert!(report.detected);
        assert_eq!(report.characters, vec!['\u{0430}']);
        assert_eq!(report.matches, vec!["pandas".to_string()]);
    }

    #[test]
    fn homoglyph_detection_escalates_typosquat_to_critical() {
        let report =
            check_typosquatting("requ\u{0435}sts", &refs(&["requests"]), TYPOSQUAT_THRESHOLD);
        assert!(report.is_match);
        assert_eq!(report.severity, Severity::Critical);
    }

    #[test]
    fn clean_name_has_no_homoglyphs() {
        let report = check_homoglyphs("leftpad", &refs(&["requests"]));
        assert!(!report.detected);
        assert!(report.characters.is_empty());
    }

    #[test]
    fn combosquatting_suffix_addition() {
        let report = check_combosquatting("requests-secure", &refs(&["requests"]));
        assert!(report.is_match);
        assert_eq!(report.base_name.as_deref(), Some("requests"));
        assert_eq!(report.pattern, Some(ComboPattern::Suffix));
        assert_eq!(report.addition.as_deref(), Some("-secure"));
    }

    #[test]
    fn combosquatting_prefix_addition() {
        let report = check_combosquatting("py-requests", &refs(&["requests"]));
        assert!(report.is_match);
        assert_eq!(report.pattern, Some(ComboPattern::Prefix));
        assert_eq!(report.addition.as_deref(), Some("py-"));
    }

    #[test]
    fn exact_name_is_not_combosquatting() {
        let report = check_combosquatting("requests", &refs(&["requests"]));
        assert!(!report.is_match);
    }

    #[test]
    fn unrelated_name_is_not_combosquatting() {
        let report = check_combosquatting("leftpad", &refs(&["requests"]));
        assert!(!report.is_match);
    }
}
