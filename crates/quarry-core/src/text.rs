//! Tokenization shared by lexical scoring, hashing embedders, and shingling.

/// Lowercase alphanumeric terms of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| s.chars().count() >= 2)
        .map(|s| s.to_lowercase())
        .collect()
}

/// Whitespace-collapsed lowercase text, used for content hashing.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// FNV-1a 64-bit hash of a term.
pub fn fnv1a(term: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in term.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_punctuation_and_short_terms() {
        assert_eq!(
            tokenize("Calibration: step-by-step, a B2 guide!"),
            vec!["calibration", "step", "by", "step", "b2", "guide"]
        );
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Torque\n\tTABLE  row "), "torque table row");
    }
}
