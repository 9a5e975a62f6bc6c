//! Stateless detection algorithms: entropy scoring, package-name squatting,
//! and manifest field validation.

pub mod entropy;
pub mod manifest;
pub mod packages;
pub mod squatting;

pub use self::entropy::{analyze, entropy, is_likely_encoded, StringProfile};
pub use self::manifest::{validate_author, validate_description, AuthorReport, DescriptionReport};
pub use self::packages::ReferencePackages;
pub use self::squatting::{
    check_combosquatting, check_homoglyphs, check_typosquatting, levenshtein, ComboPattern,
    ComboReport, HomoglyphReport, TyposquatReport,
};
