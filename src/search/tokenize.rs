//! Keyword extraction and word-boundary helpers.

use ahash::AHashSet;
use regex::Regex;
use std::sync::LazyLock;

/// Common English function words that carry no intent.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "should", "could", "may", "might", "must", "can", "this",
    "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "what", "which", "who",
    "when", "where", "why", "how", "all", "each", "every", "both", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
    "just", "now", "then", "here", "there",
];

/// Short tokens that are kept even though they are three letters or fewer.
pub(crate) const IMPORTANT_SHORT_WORDS: &[&str] = &["min", "max", "asc", "desc", "csv", "str"];

/// Minimum length (exclusive) for an ordinary token to count as a keyword.
const MIN_KEYWORD_LENGTH: usize = 2;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]+\b").expect("static regex is valid"));

/// Extract the ordered, de-duplicated keywords of `text`.
///
/// Only runs of ASCII letters bounded by non-word characters become tokens, so `abc123`
/// and `snake_case` produce nothing. A token is kept when it is longer than two letters
/// and not a stop word, or when it is one of [`IMPORTANT_SHORT_WORDS`].
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut seen = AHashSet::new();

    WORD.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|word| {
            (word.len() > MIN_KEYWORD_LENGTH && !STOP_WORDS.contains(word))
                || IMPORTANT_SHORT_WORDS.contains(word)
        })
        .filter(|word| seen.insert(*word))
        .map(str::to_string)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `needle` occurs in `haystack` delimited by word boundaries on both sides,
/// with the same boundary semantics as regex `\b`.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let first = needle.chars().next().is_some_and(is_word_char);
    let last = needle.chars().next_back().is_some_and(is_word_char);

    // Overlapping occurrences count: a rejected hit must not hide a later one
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back().is_some_and(is_word_char);
        let after = haystack[end..].chars().next().is_some_and(is_word_char);
        if before != first && after != last {
            return true;
        }
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
