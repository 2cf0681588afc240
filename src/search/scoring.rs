//! Relevance scoring of one catalog entry against one parsed intent.
//!
//! A score is built in two accumulators. The main score collects name, language and
//! intent-level signals; a separate keyword score collects keyword evidence and is merged
//! into the main score with a cap. Both are driven by the ordered rule tables in
//! [`super::rules`]. The result is clamped to `[0, 1]`.

use super::intent::Intent;
use super::rules::{INTENT_RULES, KEYWORD_RULES, NAME_RULES, Rule};
use super::tokenize::contains_word;
use crate::catalog::CatalogEntry;
use ahash::AHashSet;

/// Minimum length (exclusive) of a name variant for the exact-name shortcut.
const MIN_VARIANT_LENGTH: usize = 3;

/// Keyword score weight and cap when some query keyword hits the entry name.
const NAME_HIT_WEIGHT: f64 = 0.7;
/// Keyword score weight and cap otherwise.
const BASE_KEYWORD_WEIGHT: f64 = 0.5;

/// Precomputed view of one (intent, entry) pair shared by every rule.
pub(crate) struct Signals<'a> {
    pub intent: &'a Intent,
    pub entry: &'a CatalogEntry,
    /// Lowercased query text
    pub text: &'a str,
    /// Lowercased entry name
    pub name: String,
    /// `name` split on underscores
    pub name_parts: Vec<String>,
    /// `name` with underscores removed
    pub compact_name: String,
    /// Lowercased entry description
    pub description: String,
    pub intent_keywords: AHashSet<&'a str>,
    /// Query keywords that are also entry keywords
    pub common_keywords: AHashSet<&'a str>,
    entry_keyword_count: usize,
}

impl<'a> Signals<'a> {
    pub(crate) fn new(intent: &'a Intent, entry: &'a CatalogEntry) -> Self {
        let name = entry.name.to_lowercase();
        let name_parts = name.split('_').map(str::to_string).collect();
        let compact_name = name.replace('_', "");

        let intent_keywords: AHashSet<&str> = intent.keywords.iter().map(String::as_str).collect();
        let entry_keywords: AHashSet<&str> = entry.keywords.iter().map(String::as_str).collect();
        let common_keywords = intent_keywords
            .intersection(&entry_keywords)
            .copied()
            .collect();

        Self {
            intent,
            entry,
            text: &intent.original_text,
            name,
            name_parts,
            compact_name,
            description: entry.description.to_lowercase(),
            intent_keywords,
            common_keywords,
            entry_keyword_count: entry_keywords.len(),
        }
    }

    /// Whether the entry id is exactly `id`.
    pub fn is(&self, id: &str) -> bool {
        self.entry.id == id
    }

    pub fn name_has(&self, needle: &str) -> bool {
        self.name.contains(needle)
    }

    pub fn name_has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|needle| self.name.contains(needle))
    }

    pub fn text_has(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    pub fn text_has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|needle| self.text.contains(needle))
    }

    /// Whether `keyword` is one of the query's keywords.
    pub fn kw(&self, keyword: &str) -> bool {
        self.intent_keywords.contains(keyword)
    }

    pub fn kw_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.intent_keywords.contains(kw))
    }

    /// Names the query could be using for this entry, for the exact-name shortcut.
    fn name_variants(&self) -> Vec<String> {
        let mut variants = vec![
            self.name.clone(),
            self.compact_name.clone(),
            self.name.replace('_', " "),
            self.name.replace('_', "-"),
        ];

        if self.entry.is_language("javascript") && self.name_parts.len() > 1 {
            let mut camel = self.name_parts[0].clone();
            for part in &self.name_parts[1..] {
                let mut chars = part.chars();
                if let Some(first) = chars.next() {
                    camel.extend(first.to_uppercase());
                    camel.push_str(chars.as_str());
                }
            }
            variants.push(camel);
        }

        variants
    }

    /// Whether the query names this entry outright as a whole word.
    ///
    /// The query text is lowercased, so variants are compared lowercased too.
    pub(crate) fn names_entry_exactly(&self) -> bool {
        self.name_variants().iter().any(|variant| {
            variant.len() > MIN_VARIANT_LENGTH && contains_word(self.text, &variant.to_lowercase())
        })
    }

    /// Overlap ratio that seeds the keyword score, if both sides have keywords.
    pub(crate) fn keyword_overlap(&self) -> Option<f64> {
        if self.intent_keywords.is_empty() || self.entry_keyword_count == 0 {
            return None;
        }
        let denominator = self.intent_keywords.len().max(self.entry_keyword_count);
        Some(self.common_keywords.len() as f64 / denominator as f64)
    }

    /// How many query keywords hit the entry name (as a part or a substring).
    pub(crate) fn name_matches(&self) -> usize {
        self.intent
            .keywords
            .iter()
            .filter(|kw| {
                **kw == self.name || self.name_parts.contains(*kw) || self.name.contains(kw.as_str())
            })
            .count()
    }
}

/// Fold `rules` over `start`, logging every rule that fired.
fn apply_rules(rules: &[Rule], signals: &Signals<'_>, start: f64) -> f64 {
    rules.iter().fold(start, |acc, rule| {
        let delta = (rule.apply)(signals, acc);
        if delta != 0.0 {
            tracing::trace!(entry = %signals.entry.id, rule = rule.name, delta, "rule fired");
        }
        acc + delta
    })
}

/// Relevance of `entry` to `intent`, in `[0, 1]`.
///
/// Deterministic and side-effect free. A query that names the entry outright scores 1.0.
pub fn score(intent: &Intent, entry: &CatalogEntry) -> f64 {
    let signals = Signals::new(intent, entry);

    if signals.names_entry_exactly() {
        tracing::trace!(entry = %entry.id, "exact name match");
        return 1.0;
    }

    let mut score = apply_rules(NAME_RULES, &signals, 0.0);

    if let Some(overlap) = signals.keyword_overlap() {
        let keyword_score = apply_rules(KEYWORD_RULES, &signals, overlap);
        score += if signals.name_matches() > 0 {
            (keyword_score * NAME_HIT_WEIGHT).min(NAME_HIT_WEIGHT)
        } else {
            (keyword_score * BASE_KEYWORD_WEIGHT).min(BASE_KEYWORD_WEIGHT)
        };
    }

    let score = apply_rules(INTENT_RULES, &signals, score);
    score.clamp(0.0, 1.0)
}
