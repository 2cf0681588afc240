//! Turns a free-text task description into structured matching signals.

use super::tokenize::extract_keywords;
use crate::types::{Action, DataType, Language, SortOrder};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Synonyms per action, scanned in table order.
const ACTION_SYNONYMS: &[(Action, &[&str])] = &[
    (Action::Sort, &["sort", "order", "arrange", "organize", "rank", "ranked"]),
    (Action::Filter, &["filter", "find", "select", "extract", "get"]),
    (Action::Transform, &["convert", "transform", "change", "modify", "update"]),
    (
        Action::Calculate,
        &["calculate", "compute", "sum", "count", "average", "total", "determine", "get"],
    ),
    (Action::Merge, &["merge", "combine", "join", "concatenate", "unite"]),
    (Action::Remove, &["remove", "delete", "eliminate", "drop", "deduplicate"]),
    (Action::Duplicate, &["duplicate", "copy", "repeat"]),
    (Action::Unique, &["unique", "distinct", "deduplicate", "remove duplicates"]),
    (Action::Reverse, &["reverse", "flip", "invert"]),
    (Action::Search, &["search", "find", "locate", "lookup"]),
    (Action::Validate, &["validate", "check", "verify", "test"]),
    (Action::Format, &["format", "formatting", "style"]),
    (Action::Parse, &["parse", "read", "extract", "decode"]),
    (Action::Group, &["group", "organize", "categorize", "organize by"]),
];

/// When several actions match, the first of these that matched wins.
const ACTION_PRIORITY: &[Action] = &[
    Action::Group,
    Action::Parse,
    Action::Validate,
    Action::Format,
    Action::Sort,
    Action::Filter,
    Action::Merge,
    Action::Remove,
    Action::Transform,
];

const DATA_TYPE_SYNONYMS: &[(DataType, &[&str])] = &[
    (DataType::List, &["list", "array", "sequence", "collection"]),
    (
        DataType::Dictionary,
        &["dictionary", "dict", "map", "object", "key-value"],
    ),
    (DataType::String, &["string", "text", "str"]),
    (DataType::Number, &["number", "num", "integer", "int", "float"]),
    (DataType::Tuple, &["tuple", "pair"]),
    (DataType::Set, &["set", "collection"]),
];

const ORDER_SYNONYMS: &[(SortOrder, &[&str])] = &[
    (
        SortOrder::Ascending,
        &["ascending", "asc", "increasing", "low to high", "small to large"],
    ),
    (
        SortOrder::Descending,
        &["descending", "desc", "decreasing", "high to low", "large to small"],
    ),
];

static UNDERSCORE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z_]+_[a-z_]+\b").expect("static regex is valid"));
static CAMEL_CASE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]+[A-Z][a-zA-Z]*\b").expect("static regex is valid"));
static WORD_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z]{3,})\s+([a-z]{3,})\b").expect("static regex is valid")
});

/// Structured interpretation of one query. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub action: Option<Action>,
    pub data_type: Option<DataType>,
    pub order: Option<SortOrder>,
    /// First-occurrence ordered, de-duplicated keywords
    pub keywords: Vec<String>,
    /// Lowercased query text
    pub original_text: String,
    pub detected_language: Option<Language>,
    /// Name-like fragments of the query, in extraction order, duplicates kept
    pub potential_function_names: Vec<String>,
}

impl Intent {
    /// Parse `text` into an intent. Never fails; missing signals stay unset.
    pub fn parse(text: &str) -> Self {
        let lower = text.to_lowercase();

        let detected_language = detect_language(&lower);
        let mut action = detect_action(&lower);

        let data_type = if mentions_letter_case(&lower) {
            if ["find", "search", "get"].iter().any(|cue| lower.contains(cue))
                && matches!(action, None | Some(Action::Filter))
            {
                action = Some(Action::Search);
            }
            Some(DataType::String)
        } else {
            first_match(DATA_TYPE_SYNONYMS, &lower)
        };

        let order = first_match(ORDER_SYNONYMS, &lower);
        let keywords = extract_keywords(text);
        let potential_function_names = potential_function_names(text, &lower);

        Self {
            action,
            data_type,
            order,
            keywords,
            original_text: lower,
            detected_language,
            potential_function_names,
        }
    }

    /// Whether the query text contains `needle` anywhere.
    pub fn mentions(&self, needle: &str) -> bool {
        self.original_text.contains(needle)
    }
}

/// Shorthand for [`Intent::parse`].
pub fn parse_intent(text: &str) -> Intent {
    Intent::parse(text)
}

fn detect_language(lower: &str) -> Option<Language> {
    Language::ALL
        .iter()
        .copied()
        .find(|lang| lang.aliases().iter().any(|alias| lower.contains(alias)))
}

fn detect_action(lower: &str) -> Option<Action> {
    let matched: Vec<Action> = ACTION_SYNONYMS
        .iter()
        .filter(|(_, synonyms)| synonyms.iter().any(|s| lower.contains(s)))
        .map(|(action, _)| *action)
        .collect();

    ACTION_PRIORITY
        .iter()
        .copied()
        .find(|action| matched.contains(action))
        .or_else(|| matched.first().copied())
}

fn first_match<T: Copy>(table: &[(T, &[&str])], lower: &str) -> Option<T> {
    table
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| lower.contains(s)))
        .map(|(value, _)| *value)
}

/// Upper/lower-case wording, which always means the query is about strings.
fn mentions_letter_case(lower: &str) -> bool {
    (lower.contains("upper") && lower.contains("case"))
        || lower.contains("uppercase")
        || (lower.contains("lower") && lower.contains("case"))
        || lower.contains("lowercase")
        || lower.contains("capital")
}

/// Candidate identifiers: snake_case runs, camelCase runs, then adjacent word pairs.
fn potential_function_names(text: &str, lower: &str) -> Vec<String> {
    let underscored = UNDERSCORE_NAME
        .find_iter(lower)
        .map(|m| m.as_str().to_string());
    let camel = CAMEL_CASE_NAME
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase());
    let pairs = WORD_PAIR
        .captures_iter(lower)
        .map(|caps| format!("{}_{}", &caps[1], &caps[2]));

    underscored.chain(camel).chain(pairs).collect()
}
