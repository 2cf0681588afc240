//! Ordered scoring rules.
//!
//! Each rule looks at one (intent, entry) pair and the running value of the accumulator it
//! feeds, and returns a delta. Rules run in table order; several read the running value,
//! so reordering them changes rankings.
//!
//! A number of rules single out specific catalog ids (`sort_desc_unique`, `group_by_key`,
//! `flatten_list`, ...). They separate entries whose keywords overlap almost completely.

use super::scoring::Signals;
use crate::types::{Action, DataType, SortOrder};
use ahash::AHashSet;
use regex::Regex;
use std::sync::LazyLock;

/// A named scoring step.
pub(crate) struct Rule {
    pub name: &'static str,
    pub apply: fn(&Signals<'_>, f64) -> f64,
}

macro_rules! rules {
    ($($rule:ident),+ $(,)?) => {
        &[$(Rule { name: stringify!($rule), apply: $rule }),+]
    };
}

/// Name and language signals, applied to the main score first.
pub(crate) const NAME_RULES: &[Rule] = rules![name_phrase, name_parts, potential_name, language];

/// Keyword evidence, applied to the keyword score seeded with the overlap ratio.
pub(crate) const KEYWORD_RULES: &[Rule] = rules![
    keyword_in_name,
    requested_name,
    important_keywords,
    min_max_keywords,
    compound_keywords,
    remove_duplicates,
    unique_with_duplicates,
    unique_sort_order,
    group_by_key,
    flatten_nested,
    transform_list,
    join_means_merge,
    count_in_string,
    find_uppercase,
    find_extreme_in_list,
    extract_from_text,
];

/// Intent-level signals, applied to the main score after the keyword score is merged.
pub(crate) const INTENT_RULES: &[Rule] = rules![
    action_match,
    search_list_extremes,
    calculate_extremes,
    letter_case_lookup,
    rank_cue,
    organize_list,
    data_type_match,
    order_match,
    popularity,
    description_overlap,
];

/// Keywords worth extra weight when query and entry share them.
const IMPORTANT_KEYWORDS: &[&str] = &[
    "minimum", "maximum", "min", "max", "smallest", "largest", "lowest", "highest", "duplicate",
    "unique", "reverse", "merge", "sort", "filter", "sum", "count", "average", "total", "mean",
    "flatten", "group", "parse", "validate", "format", "email", "csv", "join", "deduplicate",
    "uppercase", "lowercase", "upper", "lower", "capital", "capitalize", "case", "short",
    "first", "slice", "take", "limit", "chunk", "split", "locate", "find", "search", "get",
    "calculate", "compute", "string", "text",
];

const MIN_WORDS: &[&str] = &["min", "minimum", "smallest", "lowest"];
const MAX_WORDS: &[&str] = &["max", "maximum", "largest", "highest"];
/// Name fragments of aggregate functions that compete with min/max lookups.
const AGGREGATE_NAMES: &[&str] = &["calculate", "sum", "count"];

const DESCENDING_CUES: &[&str] = &[
    "desc",
    "descending",
    "decreasing",
    "high to low",
    "large to small",
    "biggest",
    "largest",
    "rank",
];
const ASCENDING_CUES: &[&str] = &[
    "asc",
    "ascending",
    "increasing",
    "low to high",
    "small to large",
    "smallest",
];
const DESCENDING_HINTS: &[&str] = &["desc", "descending", "decreasing", "high", "large", "big", "rank"];
const ASCENDING_HINTS: &[&str] = &["asc", "ascending", "increasing", "low", "small"];

/// Words ignored when comparing the query with an entry description.
const DESCRIPTION_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

static NAME_REQUESTS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"function\s+([a-z_]+)",
        r"code\s+for\s+([a-z_]+)",
        r"get\s+([a-z_]+)",
        r"([a-z_]+)\s+function",
    ]
    .map(|pattern| Regex::new(pattern).expect("static regex is valid"))
});

const fn pick(condition: bool, delta: f64) -> f64 {
    if condition { delta } else { 0.0 }
}

fn count_in(haystack: &[&str], candidates: &[&str]) -> usize {
    candidates.iter().filter(|c| haystack.contains(*c)).count()
}

// --- name and language ---

fn name_phrase(s: &Signals<'_>, _: f64) -> f64 {
    let spaced = s.name.replace('_', " ");
    pick(spaced.len() > 3 && s.text_has(&spaced), 0.6)
}

fn name_parts(s: &Signals<'_>, _: f64) -> f64 {
    let total = s.name_parts.len();
    if total < 2 {
        return 0.0;
    }
    let present = s
        .name_parts
        .iter()
        .filter(|part| part.len() > 2 && s.text_has(part))
        .count();
    if present == total {
        0.5
    } else if present as f64 >= total as f64 * 0.7 {
        0.3
    } else {
        0.0
    }
}

fn potential_name(s: &Signals<'_>, _: f64) -> f64 {
    let per_hit = if s.text_has("function") || s.text_has("code") {
        1.0
    } else {
        0.8
    };
    let hits = s
        .intent
        .potential_function_names
        .iter()
        .filter(|candidate| **candidate == s.name || **candidate == s.compact_name)
        .count();
    hits as f64 * per_hit
}

fn language(s: &Signals<'_>, _: f64) -> f64 {
    match s.intent.detected_language {
        Some(lang) if lang.matches(&s.entry.language) => 0.4,
        Some(_) => -0.6,
        None => 0.0,
    }
}

// --- keyword evidence ---

fn keyword_in_name(s: &Signals<'_>, _: f64) -> f64 {
    s.intent
        .keywords
        .iter()
        .map(|kw| {
            if *kw == s.name || s.name_parts.contains(kw) {
                0.8
            } else if s.name_has(kw) {
                0.5
            } else if s.description.contains(kw.as_str()) {
                0.25
            } else {
                0.0
            }
        })
        .sum()
}

/// "function foo", "code for foo", "get foo", "foo function" naming this entry.
fn requested_name(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.text_has("function") || s.text_has("code for") || s.text_has("get")) {
        return 0.0;
    }
    for pattern in NAME_REQUESTS.iter() {
        let Some(caps) = pattern.captures(s.text) else {
            continue;
        };
        let requested = &caps[1];
        if requested == s.name || requested == s.compact_name {
            return 2.0;
        }
        let parts: Vec<&str> = requested.split('_').collect();
        if parts.len() == s.name_parts.len()
            && parts.iter().all(|part| s.name_parts.iter().any(|p| p == part))
        {
            return 1.5;
        }
    }
    0.0
}

fn important_count(s: &Signals<'_>) -> usize {
    s.common_keywords
        .iter()
        .filter(|kw| IMPORTANT_KEYWORDS.contains(*kw))
        .count()
}

fn important_keywords(s: &Signals<'_>, _: f64) -> f64 {
    important_count(s) as f64 * 0.3
}

/// Direction-aware weighting when the query and entry share min/max vocabulary.
fn min_max_keywords(s: &Signals<'_>, _: f64) -> f64 {
    let shared: Vec<&str> = s
        .common_keywords
        .iter()
        .copied()
        .filter(|kw| MIN_WORDS.contains(kw) || MAX_WORDS.contains(kw))
        .collect();
    if shared.is_empty() {
        return 0.0;
    }

    let mut delta = pick(
        shared
            .iter()
            .any(|kw| s.name_has(kw) || s.description.contains(kw)),
        0.7,
    );

    let directions = [
        (count_in(&shared, MIN_WORDS) > 0, "min", "max"),
        (count_in(&shared, MAX_WORDS) > 0, "max", "min"),
    ];
    for (requested, wanted, opposite) in directions {
        if !requested {
            continue;
        }
        if s.name_has(wanted) {
            delta += 0.8;
        } else if s.name_has(opposite) {
            delta -= 0.5;
        } else if s.name_has_any(AGGREGATE_NAMES) {
            delta -= 0.4;
        }
    }
    delta
}

fn compound_keywords(s: &Signals<'_>, _: f64) -> f64 {
    pick(important_count(s) >= 2, 0.25)
}

fn wants_removal(s: &Signals<'_>) -> bool {
    s.kw_any(&["remove", "delete", "deduplicate"]) || s.text_has("get rid of")
}

fn mentions_duplicates(s: &Signals<'_>) -> bool {
    s.kw_any(&["duplicate", "duplicates"])
}

fn mentions_unique(s: &Signals<'_>) -> bool {
    s.kw_any(&["unique", "distinct"])
}

fn mentions_sort(s: &Signals<'_>) -> bool {
    s.kw_any(&["sort", "order", "arrange"])
}

/// "remove duplicates" / "deduplicate" means remove_duplicates, not a sorting helper.
fn remove_duplicates(s: &Signals<'_>, _: f64) -> f64 {
    let removal = wants_removal(s) || s.text_has("deduplicate");
    if !(removal && (mentions_duplicates(s) || mentions_unique(s))) {
        return 0.0;
    }
    if s.is("remove_duplicates") {
        0.5
    } else if s.name_has("sort") && !mentions_sort(s) {
        -0.3
    } else {
        0.0
    }
}

/// "unique" and "duplicate" without "remove": sorting decides between the two families.
fn unique_with_duplicates(s: &Signals<'_>, _: f64) -> f64 {
    if !(mentions_unique(s) && mentions_duplicates(s)) || wants_removal(s) {
        return 0.0;
    }
    if mentions_sort(s) {
        if s.name_has("sort") && s.name_has("unique") {
            0.2
        } else {
            pick(s.is("remove_duplicates"), -0.1)
        }
    } else if s.is("remove_duplicates") {
        0.2
    } else {
        pick(s.name_has("sort"), -0.1)
    }
}

/// Choose between sort_desc_unique and sort_asc_unique when no order was parsed.
fn unique_sort_order(s: &Signals<'_>, _: f64) -> f64 {
    let sorting = mentions_sort(s);
    let unique = mentions_unique(s);
    let ascending = s.text_has_any(ASCENDING_CUES);
    let descending = s.text_has_any(DESCENDING_CUES) || (s.text_has("rank") && !ascending);
    let simple_sort = s.intent.keywords.len() <= 2 && sorting && !unique;

    let (desc_delta, asc_delta) = if sorting && unique && s.intent.order.is_none() {
        if descending {
            (0.4, -0.3)
        } else if ascending {
            (-0.3, 0.4)
        } else {
            (0.2, -0.15)
        }
    } else if simple_sort {
        (0.25, -0.15)
    } else {
        return 0.0;
    };

    if s.is("sort_desc_unique") {
        desc_delta
    } else if s.is("sort_asc_unique") {
        asc_delta
    } else {
        0.0
    }
}

fn group_by_key(s: &Signals<'_>, _: f64) -> f64 {
    let grouping = s.kw_any(&["group", "organize", "categorize"]);
    let keyed = s.kw_any(&["key", "keys"]);
    if !(grouping || keyed) {
        return 0.0;
    }
    if s.is("group_by_key") {
        if keyed { 0.6 } else { 0.5 }
    } else {
        pick(s.is("flatten_list"), -0.3)
    }
}

fn flatten_nested(s: &Signals<'_>, _: f64) -> f64 {
    if !s.kw_any(&["flatten", "nested", "unpack"]) {
        return 0.0;
    }
    if s.is("flatten_list") {
        0.5
    } else {
        pick(
            s.is("group_by_key") && !s.kw("group") && !s.kw("key"),
            -0.2,
        )
    }
}

/// "transform a list" is ambiguous between grouping and flattening.
fn transform_list(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.kw("transform") && s.intent.data_type == Some(DataType::List)) {
        return 0.0;
    }
    let (group_delta, flatten_delta) = if s.kw_any(&["key", "keys"]) {
        (0.4, -0.2)
    } else if s.kw("nested") {
        (-0.2, 0.4)
    } else {
        (0.2, -0.1)
    };

    if s.is("group_by_key") {
        group_delta
    } else if s.is("flatten_list") {
        flatten_delta
    } else {
        0.0
    }
}

fn join_means_merge(s: &Signals<'_>, _: f64) -> f64 {
    if !s.kw("join") {
        return 0.0;
    }
    match s.entry.action {
        Some(Action::Merge) => 0.3,
        Some(Action::Filter) => -0.2,
        _ => 0.0,
    }
}

fn mentions_uppercase(s: &Signals<'_>) -> bool {
    s.kw("upper") || s.text_has("uppercase") || s.kw("capital")
}

/// Counting inside a string: uppercase letters or words.
fn count_in_string(s: &Signals<'_>, _: f64) -> f64 {
    let counting = s.kw("count") || s.text_has("determine") || s.kw("get");
    if !(counting && s.intent.data_type == Some(DataType::String)) {
        return 0.0;
    }
    if mentions_uppercase(s) {
        if s.is("count_uppercase") {
            0.6
        } else {
            pick(s.is("count_words"), -0.2)
        }
    } else if s.is("count_words") {
        0.5
    } else {
        pick(s.is("reverse_string"), -0.25)
    }
}

fn find_uppercase(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.kw("find") && mentions_uppercase(s)) {
        return 0.0;
    }
    if s.is("find_uppercase") {
        0.6
    } else if s.name_has_any(&["max", "min"]) {
        -0.3
    } else {
        pick(s.is("count_words"), -0.2)
    }
}

/// "find ... numbers/list" prefers the min/max lookups over filters and aggregates.
fn find_extreme_in_list(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.kw("find") && s.kw_any(&["numbers", "list"])) {
        return 0.0;
    }
    let direction = if s.kw_any(MIN_WORDS) {
        Some(("min", "max"))
    } else if s.kw_any(MAX_WORDS) {
        Some(("max", "min"))
    } else {
        None
    };

    match direction {
        Some((wanted, opposite)) => {
            if s.name_has(wanted) {
                0.5
            } else if s.name_has(opposite) {
                -0.3
            } else {
                pick(s.is("filter_even"), -0.25)
            }
        }
        None => {
            if s.name_has_any(&["max", "min"]) {
                0.3
            } else if s.is("filter_even") {
                -0.2
            } else {
                pick(s.name_has_any(&["calculate", "sum"]), -0.15)
            }
        }
    }
}

fn extract_from_text(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.kw("extract") && s.kw_any(&["text", "string", "csv"])) {
        return 0.0;
    }
    if s.is("parse_csv_line") {
        0.4
    } else {
        pick(s.is("reverse_string"), -0.2)
    }
}

// --- intent-level signals ---

fn action_match(s: &Signals<'_>, _: f64) -> f64 {
    let (Some(wanted), Some(actual)) = (s.intent.action, s.entry.action) else {
        return 0.0;
    };
    if wanted == actual {
        0.25
    } else {
        pick(wanted.neighbors().contains(&actual), 0.12)
    }
}

fn search_list_extremes(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.intent.action == Some(Action::Search) && s.intent.data_type == Some(DataType::List)) {
        return 0.0;
    }
    if s.name_has_any(&["max", "maximum", "largest"]) || s.name_has_any(&["min", "minimum", "smallest"]) {
        0.25
    } else {
        pick(s.name_has_any(&["sum", "calculate", "count"]), -0.3)
    }
}

/// "calculate/locate/get the minimum" style queries.
fn calculate_extremes(s: &Signals<'_>, _: f64) -> f64 {
    let calculating = s.intent.action == Some(Action::Calculate) || s.text_has("calculate");
    if !(calculating || s.text_has("locate") || s.text_has("get")) {
        return 0.0;
    }
    let (wanted, opposite) = if s.text_has_any(&["minimum", "min", "smallest", "lowest"]) {
        ("min", "max")
    } else if s.text_has_any(&["maximum", "max", "largest", "highest"]) {
        ("max", "min")
    } else {
        return 0.0;
    };

    if s.name_has(wanted) {
        0.6
    } else if s.name_has(opposite) {
        -0.6
    } else {
        pick(s.name_has_any(&["sum", "count", "calculate"]), -0.5)
    }
}

/// "find/search/get" plus upper or lower case wording.
fn letter_case_lookup(s: &Signals<'_>, _: f64) -> f64 {
    if !s.text_has_any(&["find", "search", "get"]) {
        return 0.0;
    }
    let upper = (s.text_has("upper") && s.text_has("case"))
        || s.text_has("uppercase")
        || s.text_has("upper-case");
    let lower = (s.text_has("lower") && s.text_has("case"))
        || s.text_has("lowercase")
        || s.text_has("lower-case");

    let wanted = if upper {
        "upper"
    } else if lower {
        "lower"
    } else {
        return 0.0;
    };

    if s.name_has(wanted) && (s.name_has("case") || s.description.contains(wanted)) {
        0.8
    } else {
        pick(s.name_has_any(&["max", "min", "count"]), -0.7)
    }
}

/// "rank" implies sorting, usually best first.
fn rank_cue(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.text_has("rank") && s.entry.action == Some(Action::Sort)) {
        return 0.0;
    }
    let implied = match (s.intent.order, s.entry.order) {
        (None, Some(SortOrder::Descending)) => 0.1,
        (None, Some(SortOrder::Ascending)) => -0.05,
        _ => 0.0,
    };
    0.15 + implied
}

fn organize_list(s: &Signals<'_>, _: f64) -> f64 {
    if !(s.text_has("organize") && s.intent.data_type == Some(DataType::List)) {
        return 0.0;
    }
    if s.text_has("key") || s.text_has("group") {
        if s.is("group_by_key") {
            0.25
        } else {
            pick(s.entry.action == Some(Action::Sort), -0.1)
        }
    } else {
        pick(s.is("group_by_key"), 0.1)
    }
}

fn data_type_match(s: &Signals<'_>, _: f64) -> f64 {
    pick(
        s.intent.data_type.is_some() && s.entry.data_type == s.intent.data_type,
        0.15,
    )
}

/// Explicit order match, else order implied by wording, else a weak default.
fn order_match(s: &Signals<'_>, _: f64) -> f64 {
    let Some(entry_order) = s.entry.order else {
        return 0.0;
    };
    let Some(wanted) = s.intent.order else {
        return implied_order(s, entry_order);
    };
    pick(wanted == entry_order, 0.2)
}

fn implied_order(s: &Signals<'_>, entry_order: SortOrder) -> f64 {
    let descending = entry_order == SortOrder::Descending;
    if s.text_has_any(DESCENDING_HINTS) && descending {
        return 0.18;
    }
    if s.text_has_any(ASCENDING_HINTS) && !descending {
        return 0.18;
    }
    if s.entry.action != Some(Action::Sort) {
        return 0.0;
    }

    let very_short = s.text.split_whitespace().count() <= 3;
    if very_short && s.text_has("unique") {
        if descending { 0.08 } else { -0.05 }
    } else if descending {
        -0.03
    } else {
        0.03
    }
}

fn popularity(s: &Signals<'_>, running: f64) -> f64 {
    pick(running > 0.3, f64::from(s.entry.popularity) / 10.0 * 0.03)
}

/// Small bonus when the query and description share most of their meaningful words.
fn description_overlap(s: &Signals<'_>, running: f64) -> f64 {
    if running <= 0.4 {
        return 0.0;
    }
    let meaningful = |text: &str| -> AHashSet<String> {
        text.split_whitespace()
            .filter(|word| word.len() > 2 && !DESCRIPTION_STOP_WORDS.contains(word))
            .map(str::to_string)
            .collect()
    };
    let query_words = meaningful(s.text);
    let description_words = meaningful(&s.description);
    if query_words.is_empty() || description_words.is_empty() {
        return 0.0;
    }

    let shared = query_words.intersection(&description_words).count();
    let ratio = shared as f64 / query_words.len().max(description_words.len()) as f64;
    pick(ratio > 0.4, ratio * 0.08)
}
