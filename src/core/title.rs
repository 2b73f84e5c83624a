//! Canonical fuzzy title matching. Every component that compares song
//! titles goes through `titles_match`; there is exactly one copy of this
//! logic in the crate.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Minimum word length for the word-overlap rule.
const SIGNIFICANT_WORD_LEN: usize = 2;
/// Required share of shared significant words.
const OVERLAP_THRESHOLD: f32 = 0.7;

/// Lowercases, folds accents (NFKD, combining marks stripped), removes
/// non-word characters and collapses whitespace.
pub fn normalize(title: &str) -> String {
    let folded: String = title.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = folded.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when two titles plausibly name the same song: normalized equality,
/// containment (as substring or as a word subset), or at least 70% shared
/// significant words relative to the longer word list.
pub fn titles_match(a: &str, b: &str) -> bool {
    let na = normalize(a);
    let nb = normalize(b);
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    if na == nb || na.contains(&nb) || nb.contains(&na) {
        return true;
    }

    let words_a = significant_words(&na);
    let words_b = significant_words(&nb);
    if words_a.is_empty() || words_b.is_empty() {
        return false;
    }
    // Word-level containment catches reorderings and dropped articles
    // ("Long Winding Road" inside "The Long and Winding Road").
    if words_a.is_subset(&words_b) || words_b.is_subset(&words_a) {
        return true;
    }
    let shared = words_a.intersection(&words_b).count() as f32;
    shared / words_a.len().max(words_b.len()) as f32 >= OVERLAP_THRESHOLD
}

/// Normalized Levenshtein similarity over normalized titles. Diagnostic
/// only; never used as a match criterion.
pub fn similarity(a: &str, b: &str) -> f32 {
    let na = normalize(a);
    let nb = normalize(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&na, &nb) as f32
}

fn significant_words(normalized: &str) -> HashSet<&str> {
    normalized
        .split(' ')
        .filter(|w| w.len() > SIGNIFICANT_WORD_LEN)
        .collect()
}
