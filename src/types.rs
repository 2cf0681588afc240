//! Closed vocabularies shared by catalog entries and parsed intents.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a tag does not belong to a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! tag_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $tag:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTag;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_lowercase();
                match lower.as_str() {
                    $($tag => Ok(Self::$variant),)+
                    _ => Err(UnknownTag { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

tag_enum! {
    /// What a snippet does to its input.
    Action, "action" {
        Sort => "sort",
        Filter => "filter",
        Transform => "transform",
        Calculate => "calculate",
        Merge => "merge",
        Remove => "remove",
        Duplicate => "duplicate",
        Unique => "unique",
        Reverse => "reverse",
        Search => "search",
        Validate => "validate",
        Format => "format",
        Parse => "parse",
        Group => "group",
    }
}

tag_enum! {
    /// The shape of data a snippet operates on.
    DataType, "data type" {
        List => "list",
        Dictionary => "dictionary",
        String => "string",
        Number => "number",
        Tuple => "tuple",
        Set => "set",
    }
}

tag_enum! {
    /// Ordering preference for sort-like snippets.
    SortOrder, "order" {
        Ascending => "ascending",
        Descending => "descending",
    }
}

tag_enum! {
    /// Target programming languages the catalog carries snippets for.
    Language, "language" {
        Python => "python",
        JavaScript => "javascript",
        Java => "java",
        CSharp => "csharp",
        Go => "go",
        Rust => "rust",
    }
}

impl Action {
    /// Actions that earn partial credit when the query asked for `self`.
    pub const fn neighbors(self) -> &'static [Self] {
        match self {
            Self::Calculate => &[Self::Search],
            Self::Search => &[Self::Calculate],
            Self::Transform => &[Self::Group],
            Self::Group => &[Self::Transform],
            _ => &[],
        }
    }
}

impl Language {
    /// Substrings that identify the language inside free text.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["python", "py"],
            Self::JavaScript => &["javascript", "js", "ecmascript"],
            Self::Java => &["java"],
            Self::CSharp => &["csharp", "c#", "c sharp", "dotnet"],
            Self::Go => &["go", "golang"],
            Self::Rust => &["rust"],
        }
    }

    /// Case-insensitive comparison against a free-form language tag.
    pub fn matches(self, tag: &str) -> bool {
        tag.trim().eq_ignore_ascii_case(self.as_str())
    }
}

/// Deserialize an optional tag, treating unknown or malformed values as unset.
pub(crate) fn lenient_tag<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = UnknownTag>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse() {
        Ok(tag) => Some(tag),
        Err(err) => {
            tracing::debug!("Ignoring catalog tag: {}", err);
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("sort", Some(Action::Sort))]
    #[case("  Group ", Some(Action::Group))]
    #[case("slice", None)]
    #[case("", None)]
    fn test_action_from_str(#[case] input: &str, #[case] expected: Option<Action>) {
        check!(input.parse::<Action>().ok() == expected);
    }

    #[test]
    fn test_unknown_tag_message() {
        let err = "hashmap".parse::<DataType>().unwrap_err();
        check!(err.to_string() == "unknown data type 'hashmap'");
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        for action in Action::ALL {
            for neighbor in action.neighbors() {
                check!(neighbor.neighbors().contains(action));
            }
        }
    }

    #[rstest]
    #[case(Language::JavaScript, "JavaScript", true)]
    #[case(Language::Go, " go ", true)]
    #[case(Language::Java, "javascript", false)]
    fn test_language_matches(#[case] lang: Language, #[case] tag: &str, #[case] expected: bool) {
        check!(lang.matches(tag) == expected);
    }
}
