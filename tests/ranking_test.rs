mod common;

use assert2::{check, let_assert};
use common::{SAMPLE_QUERIES, bundled};
use rstest::rstest;
use snippet_mcp::search::compare_ranked;
use snippet_mcp::types::{Action, DataType, SortOrder};
use snippet_mcp::{Catalog, MemoryCatalog, parse_intent, rank, score};
use std::cmp::Ordering;

fn top_ids(catalog: &MemoryCatalog, query: &str, top_k: usize, lang: Option<&str>) -> Vec<String> {
    rank(query, &catalog.entries(), top_k, lang)
        .into_iter()
        .map(|r| r.entry.id)
        .collect()
}

#[rstest]
fn test_descending_unique_sort(bundled: MemoryCatalog) {
    let query = "sort a list of numbers in descending order and remove duplicates";

    let intent = parse_intent(query);
    check!(intent.action == Some(Action::Sort));
    check!(intent.data_type == Some(DataType::List));
    check!(intent.order == Some(SortOrder::Descending));

    let results = rank(query, &bundled.entries(), 3, None);
    let_assert!(Some(best) = results.first());
    check!(best.entry.id == "sort_desc_unique");
    check!(best.entry.order == Some(SortOrder::Descending));
    check!(best.entry.data_type == Some(DataType::List));
}

#[rstest]
fn test_merge_dictionaries(bundled: MemoryCatalog) {
    let query = "merge two dictionaries";

    let intent = parse_intent(query);
    check!(intent.action == Some(Action::Merge));
    check!(intent.data_type == Some(DataType::Dictionary));

    let results = rank(query, &bundled.entries(), 3, None);
    check!(results.len() == 3);
    check!(results.iter().all(|r| r.entry.action == Some(Action::Merge)));
    check!(results[0].entry.id == "merge_dicts");
}

#[rstest]
fn test_upper_case_lookup(bundled: MemoryCatalog) {
    let results = rank("find the upper case", &bundled.entries(), 3, None);
    let_assert!(Some(best) = results.first());

    let name = best.entry.name.to_lowercase();
    check!(name.contains("upper"));
    for excluded in ["max", "min", "count"] {
        check!(!name.contains(excluded));
    }
}

#[rstest]
#[case("find maximum value in list", "find_max")]
#[case("reverse a string in javascript", "reverseString_js")]
#[case("reverse a string in rust", "reverse_string_rust")]
fn test_best_match(bundled: MemoryCatalog, #[case] query: &str, #[case] expected: &str) {
    let ids = top_ids(&bundled, query, 5, None);
    check!(ids.first().map(String::as_str) == Some(expected));
}

#[rstest]
fn test_language_in_query_restricts_results(bundled: MemoryCatalog) {
    let results = rank("reverse a string in javascript", &bundled.entries(), 10, None);
    check!(!results.is_empty());
    check!(results.iter().all(|r| r.entry.language == "javascript"));
}

#[rstest]
fn test_language_filter(bundled: MemoryCatalog) {
    let ids = top_ids(&bundled, "reverse a string", 5, Some("rust"));
    check!(ids.first().map(String::as_str) == Some("reverse_string_rust"));
    check!(ids.len() == 2);
}

#[rstest]
fn test_filter_matching_nothing_is_empty(bundled: MemoryCatalog) {
    check!(rank("reverse a string", &bundled.entries(), 5, Some("cobol")).is_empty());
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(100)]
fn test_empty_catalog(#[case] top_k: usize) {
    check!(rank("sort a list", &[], top_k, None).is_empty());
}

#[rstest]
fn test_naming_an_entry_scores_full_relevance(bundled: MemoryCatalog) {
    for entry in bundled.entries().iter() {
        let intent = parse_intent(&format!("I need {}", entry.name));
        check!(score(&intent, entry) == 1.0, "entry {}", entry.id);
    }
}

#[rstest]
fn test_scores_bounded_and_deterministic(bundled: MemoryCatalog) {
    for query in SAMPLE_QUERIES {
        let intent = parse_intent(query);
        for entry in bundled.entries().iter() {
            let first = score(&intent, entry);
            check!((0.0..=1.0).contains(&first), "{} / {}", query, entry.id);
            check!(score(&parse_intent(query), entry) == first);
        }
    }
}

#[rstest]
fn test_ranked_output_is_sorted(bundled: MemoryCatalog, #[values(1, 5, 50)] top_k: usize) {
    for query in SAMPLE_QUERIES {
        let results = rank(query, &bundled.entries(), top_k, None);
        check!(results.len() <= top_k);
        for pair in results.windows(2) {
            check!(compare_ranked(&pair[0], &pair[1]) != Ordering::Greater, "{}", query);
            check!(pair[0].relevance_score >= pair[1].relevance_score, "{}", query);
        }
    }
}

#[rstest]
fn test_rank_is_repeatable(bundled: MemoryCatalog) {
    for query in SAMPLE_QUERIES {
        let first = rank(query, &bundled.entries(), 5, None);
        let second = rank(query, &bundled.entries(), 5, None);
        check!(first == second, "{}", query);
    }
}
