//! Plain-text rendering of recommendations for the CLI and MCP tools.

use crate::cache::CacheStats;
use crate::catalog::CatalogStats;
use crate::search::ScoredEntry;
use std::fmt::Write as _;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Render one recommendation: banner, code, and optionally its metadata.
pub fn format_recommendation(result: &ScoredEntry, include_metadata: bool) -> String {
    let entry = &result.entry;
    let mut output = String::new();

    let _ = writeln!(output, "{}", rule());
    let _ = writeln!(output, "Function: {}", entry.name);
    let _ = writeln!(output, "{}", rule());
    output.push('\n');
    output.push_str(&entry.code);
    output.push_str("\n\n");

    if !include_metadata {
        return output;
    }

    if !entry.description.is_empty() {
        let _ = writeln!(output, "Description: {}\n", entry.description);
    }

    if let Some(usage) = entry.usage.as_deref().filter(|usage| !usage.is_empty()) {
        let _ = writeln!(output, "Usage Example:\n{}\n", usage);
    }

    let mut metadata = Vec::new();
    if let Some(complexity) = entry.complexity.as_deref().filter(|c| !c.is_empty()) {
        metadata.push(format!("Complexity: {}", complexity));
    }
    metadata.push(format!("Relevance: {:.2}%", result.relevance_score * 100.0));
    if entry.popularity > 0 {
        metadata.push(format!("Popularity: {}/10", entry.popularity));
    }
    let _ = writeln!(output, "{}\n", metadata.join(" | "));

    output
}

/// Render several recommendations with numbered headers.
pub fn format_recommendations(results: &[ScoredEntry]) -> String {
    let mut output = String::new();
    for (index, result) in results.iter().enumerate() {
        let _ = writeln!(output, "\n{}", rule());
        let _ = writeln!(output, "RECOMMENDATION {} of {}", index + 1, results.len());
        let _ = writeln!(output, "{}\n", rule());
        output.push_str(&format_recommendation(result, true));
    }
    output
}

/// Only the code of each result, numbered when there is more than one.
pub fn format_code_only(results: &[ScoredEntry]) -> String {
    match results {
        [single] => format!("{}\n", single.entry.code),
        _ => {
            let mut output = String::new();
            for (index, result) in results.iter().enumerate() {
                let _ = writeln!(output, "# Option {}\n{}\n", index + 1, result.entry.code);
            }
            output
        }
    }
}

/// A warning when the best score is below `threshold`.
pub fn low_relevance_warning(score: f64, threshold: f64) -> Option<String> {
    (score < threshold).then(|| {
        format!(
            "Warning: Low relevance score ({:.1}%). This might not be the best match.\n\
             Consider rephrasing your query or checking that the function exists in the catalog.",
            score * 100.0
        )
    })
}

/// Catalog and cache counters.
pub fn format_stats(stats: &CatalogStats, cache: Option<&CacheStats>) -> String {
    let mut output = format!("Total functions: {}\n", stats.total_functions);
    if !stats.languages.is_empty() {
        output.push_str("Languages:\n");
        for (language, count) in &stats.languages {
            let _ = writeln!(output, "  • {}: {}", language, count);
        }
    }
    if let Some(cache) = cache {
        let _ = writeln!(
            output,
            "Search cache: {} entries, {} hits, {} misses",
            cache.entries, cache.hits, cache.misses
        );
    }
    output
}
