//! String and field similarity primitives for entity matching.
//!
//! All scorers are pure, case-folded, and deterministic: identical inputs
//! always produce identical integer scores in 0–100. Built on
//! `strsim::normalized_levenshtein`.

use std::collections::BTreeSet;

fn scaled(similarity: f64) -> u32 {
    (similarity * 100.0).round() as u32
}

/// Plain edit-distance similarity of the case-folded inputs.
pub fn ratio(a: &str, b: &str) -> u32 {
    scaled(strsim::normalized_levenshtein(
        &a.to_lowercase(),
        &b.to_lowercase(),
    ))
}

fn tokens(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Similarity after sorting whitespace-separated tokens, so word order
/// does not matter ("Dupont Jean" vs "Jean Dupont").
pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
    let mut a_tokens = tokens(a);
    let mut b_tokens = tokens(b);
    a_tokens.sort_unstable();
    b_tokens.sort_unstable();
    scaled(strsim::normalized_levenshtein(
        &a_tokens.join(" "),
        &b_tokens.join(" "),
    ))
}

/// Best similarity of the shorter string against any equally long window
/// of the longer one ("dupont" inside "jean dupont" scores 100).
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a_folded = a.to_lowercase();
    let b_folded = b.to_lowercase();

    let (shorter, longer) = if a_folded.chars().count() <= b_folded.chars().count() {
        (a_folded, b_folded)
    } else {
        (b_folded, a_folded)
    };

    let short_len = shorter.chars().count();
    let longer_chars: Vec<char> = longer.chars().collect();

    if short_len == 0 || short_len == longer_chars.len() {
        return scaled(strsim::normalized_levenshtein(&shorter, &longer));
    }

    let mut best = 0;
    for start in 0..=(longer_chars.len() - short_len) {
        let window: String = longer_chars[start..start + short_len].iter().collect();
        let score = scaled(strsim::normalized_levenshtein(&shorter, &window));
        if score > best {
            best = score;
            if best == 100 {
                break;
            }
        }
    }
    best
}

/// Set-based token similarity: shared tokens count fully, extra tokens on
/// either side only dilute the score partially.
pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    let a_set: BTreeSet<String> = tokens(a).into_iter().collect();
    let b_set: BTreeSet<String> = tokens(b).into_iter().collect();

    let intersection: Vec<&String> = a_set.intersection(&b_set).collect();
    let a_only: Vec<&String> = a_set.difference(&b_set).collect();
    let b_only: Vec<&String> = b_set.difference(&a_set).collect();

    let joined = |items: &[&String]| -> String {
        items
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let base = joined(&intersection);
    let combined_a = join_nonempty(&base, &joined(&a_only));
    let combined_b = join_nonempty(&base, &joined(&b_only));

    let pairwise = |x: &str, y: &str| scaled(strsim::normalized_levenshtein(x, y));

    pairwise(&base, &combined_a)
        .max(pairwise(&base, &combined_b))
        .max(pairwise(&combined_a, &combined_b))
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

/// Strip separators and a leading international prefix (`00` or `+`) so
/// "+33 6 12 34 56 78" and "0033612345678" normalize identically.
pub fn normalize_phone(s: &str) -> String {
    let trimmed = s.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if trimmed.starts_with('+') {
        digits
    } else if let Some(stripped) = digits.strip_prefix("00") {
        stripped.to_string()
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(ratio("Jean Dupont", "Jean Dupont"), 100);
        assert_eq!(token_sort_ratio("Jean Dupont", "Jean Dupont"), 100);
        assert_eq!(partial_ratio("Jean Dupont", "Jean Dupont"), 100);
        assert_eq!(token_set_ratio("Jean Dupont", "Jean Dupont"), 100);
    }

    #[test]
    fn scoring_is_case_folded() {
        assert_eq!(ratio("ACME Corp", "acme corp"), 100);
        assert_eq!(token_set_ratio("ACME CORP", "acme corp"), 100);
    }

    #[test]
    fn empty_vs_nonempty_scores_zero() {
        assert_eq!(ratio("", "something"), 0);
        assert_eq!(token_sort_ratio("", "something"), 0);
    }

    #[test]
    fn both_empty_scores_100() {
        assert_eq!(ratio("", ""), 100);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        assert_eq!(token_sort_ratio("Dupont Jean", "Jean Dupont"), 100);
        assert!(ratio("Dupont Jean", "Jean Dupont") < 100);
    }

    #[test]
    fn partial_finds_substring() {
        assert_eq!(partial_ratio("dupont", "Jean Dupont"), 100);
        assert_eq!(partial_ratio("Jean Dupont", "dupont"), 100);
    }

    #[test]
    fn token_set_handles_extra_tokens() {
        // Shared core "acme corp" dominates despite the extra token.
        let score = token_set_ratio("Acme Corp", "Acme Corp International");
        assert!(score >= 90, "expected >= 90, got {score}");
    }

    #[test]
    fn dissimilar_strings_score_low() {
        assert!(ratio("Plomberie Martin", "Boulangerie Petit") < 60);
    }

    #[test]
    fn scores_are_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                token_set_ratio("Rénovation cuisine", "Renovation de cuisine"),
                token_set_ratio("Rénovation cuisine", "Renovation de cuisine"),
            );
        }
    }

    #[test]
    fn phone_normalization_strips_separators() {
        assert_eq!(normalize_phone("06-12-34-56-78"), "0612345678");
        assert_eq!(normalize_phone("06 12 34 56 78"), "0612345678");
        assert_eq!(normalize_phone("(06) 12.34.56.78"), "0612345678");
    }

    #[test]
    fn phone_international_prefixes_collapse() {
        assert_eq!(normalize_phone("+33 6 12 34 56 78"), "33612345678");
        assert_eq!(normalize_phone("0033 6 12 34 56 78"), "33612345678");
        assert_eq!(
            normalize_phone("+33612345678"),
            normalize_phone("0033612345678")
        );
    }

    #[test]
    fn phone_empty_input_normalizes_empty() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("ext."), "");
    }
}
