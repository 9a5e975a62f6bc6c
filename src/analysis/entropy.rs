//! Shannon-entropy scoring for detecting encoded or encrypted payloads.
//!
//! Normal English text sits around 4.0-4.5 bits of entropy per character,
//! base64 around 5.0-6.0, and random/encrypted data above 5.5. Strings that
//! clear the threshold are strong obfuscation indicators.

use std::collections::HashMap;

/// Entropy at or above this value is treated as likely-encoded content.
pub const ENTROPY_THRESHOLD: f64 = 5.0;

/// Strings shorter than this are too short to score meaningfully.
pub const MIN_ANALYZED_LENGTH: usize = 40;

const BASE64_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

/// Shannon entropy over the character-frequency distribution of `s`, in bits.
///
/// Empty input yields 0, as does any single-symbol string such as `"aaaa"`.
pub fn entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    let mut len = 0usize;
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
        len += 1;
    }

    let len = len as f64;
    let mut h = 0.0;
    for &count in freq.values() {
        let p = count as f64 / len;
        h -= p * p.log2();
    }
    h
}

/// Whether `s` is long enough and random enough to be encoded/obfuscated data.
pub fn is_likely_encoded(s: &str, threshold: f64, min_length: usize) -> bool {
    if s.chars().count() < min_length {
        return false;
    }
    entropy(s) >= threshold
}

/// Combined pattern profile of a string.
#[derive(Debug, Clone, PartialEq)]
pub struct StringProfile {
    pub entropy: f64,
    pub high_entropy: bool,
    pub likely_base64: bool,
    pub likely_hex: bool,
    /// Unique characters divided by total length.
    pub char_diversity: f64,
}

/// Profile a string for encoding indicators beyond raw entropy: near-pure
/// base64/hex alphabets with plausible lengths, and extreme repetition.
pub fn analyze(s: &str) -> StringProfile {
    let len = s.chars().count();
    if len == 0 {
        return StringProfile {
            entropy: 0.0,
            high_entropy: false,
            likely_base64: false,
            likely_hex: false,
            char_diversity: 0.0,
        };
    }

    let h = entropy(s);

    let base64_count = s.chars().filter(|c| BASE64_ALPHABET.contains(*c)).count();
    let likely_base64 = base64_count as f64 / len as f64 > 0.95 && len % 4 == 0;

    let hex_count = s.chars().filter(|c| c.is_ascii_hexdigit()).count();
    let likely_hex = hex_count as f64 / len as f64 > 0.95 && len % 2 == 0;

    let unique: std::collections::HashSet<char> = s.chars().collect();
    let char_diversity = unique.len() as f64 / len as f64;

    StringProfile {
        entropy: h,
        high_entropy: h >= ENTROPY_THRESHOLD,
        likely_base64,
        likely_hex,
        char_diversity,
    }
}

/// High-level check: is this string suspicious, and why.
pub fn suspicion(s: &str) -> Option<String> {
    let profile = analyze(s);

    if profile.high_entropy {
        if profile.likely_base64 {
            return Some("high entropy base64-like pattern".to_string());
        }
        if profile.likely_hex {
            return Some("high entropy hexadecimal pattern".to_string());
        }
        return Some(format!(
            "very high entropy ({:.2}), likely encoded or encrypted",
            profile.entropy
        ));
    }

    // Extreme repetition is a padding/obfuscation indicator distinct from
    // high entropy.
    if profile.char_diversity < 0.1 && s.chars().count() > 50 {
        return Some("extremely low character diversity, suspicious padding".to_string());
    }

    None
}
