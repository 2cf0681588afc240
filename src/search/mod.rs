//! Intent extraction and relevance ranking.
//!
//! A query flows through [`tokenize`] and [`intent`] into a structured [`Intent`], every
//! catalog entry is scored against it by [`scoring`] (driven by the rule tables in
//! `rules`), and [`rank`] orders and truncates the result.

pub mod intent;
pub mod rank;
mod rules;
pub mod scoring;
pub mod tokenize;

pub use intent::{Intent, parse_intent};
pub use rank::{ScoredEntry, compare_ranked, rank};
pub use scoring::score;
pub use tokenize::extract_keywords;
