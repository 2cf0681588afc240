//! Snippet catalog: entry metadata and the read-only providers the ranker consumes.
//!
//! Providers hand out immutable snapshots (`Arc<Vec<CatalogEntry>>`) so ranking never
//! holds a lock while scoring.

mod json;

pub use json::JsonCatalog;

use crate::types::{Action, DataType, Language, SortOrder, lenient_tag};
use ahash::AHashSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The catalog shipped with the binary, used when no catalog file is configured.
pub const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.json");

/// Error returned when a catalog cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read catalog at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Catalog text is not a JSON array of entries.
    #[error("failed to parse catalog {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    /// Two entries share an id.
    #[error("duplicate catalog id '{0}'")]
    DuplicateId(String),
}

/// One reusable code snippet with its matching metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub code: String,
    #[serde(default = "default_language", deserialize_with = "language_or_default")]
    pub language: String,
    #[serde(
        default,
        deserialize_with = "lenient_tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub action: Option<Action>,
    #[serde(
        default,
        deserialize_with = "lenient_tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_type: Option<DataType>,
    #[serde(
        default,
        deserialize_with = "lenient_tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<SortOrder>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default = "default_popularity", deserialize_with = "clamped_popularity")]
    pub popularity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
}

fn default_language() -> String {
    Language::Python.as_str().to_string()
}

const fn default_popularity() -> u8 {
    5
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Null means the default; anything outside `0..=10` is clamped into it.
fn clamped_popularity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?
        .and_then(|value| u8::try_from(value.clamp(0, 10)).ok())
        .unwrap_or_else(default_popularity))
}

fn language_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|lang| !lang.trim().is_empty())
        .unwrap_or_else(default_language))
}

impl CatalogEntry {
    /// Create an entry with default metadata. Mostly useful for tests and fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            code: String::new(),
            language: default_language(),
            action: None,
            data_type: None,
            order: None,
            keywords: Vec::new(),
            popularity: default_popularity(),
            usage: None,
            complexity: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub const fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub const fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub const fn with_order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub const fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = popularity;
        self
    }

    /// Lowercase the language tag and keywords, drop duplicate keywords and clamp popularity.
    pub fn normalize(&mut self) {
        self.language = self.language.trim().to_lowercase();
        let mut seen = AHashSet::with_capacity(self.keywords.len());
        self.keywords = std::mem::take(&mut self.keywords)
            .into_iter()
            .map(|kw| kw.trim().to_lowercase())
            .filter(|kw| !kw.is_empty() && seen.insert(kw.clone()))
            .collect();
        self.popularity = self.popularity.min(10);
    }

    /// Whether this entry belongs to `language` (case-insensitive).
    pub fn is_language(&self, language: &str) -> bool {
        self.language.trim().eq_ignore_ascii_case(language.trim())
    }
}

/// Entry counts for a catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total_functions: usize,
    pub languages: BTreeMap<String, usize>,
}

impl CatalogStats {
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut languages = BTreeMap::new();
        for entry in entries {
            *languages.entry(entry.language.clone()).or_insert(0) += 1;
        }
        Self {
            total_functions: entries.len(),
            languages,
        }
    }
}

/// Read-only source of catalog entries.
pub trait Catalog: Send + Sync {
    /// Every entry together with the generation they belong to, read atomically.
    ///
    /// The generation changes whenever the content changes. Callers that key cached
    /// results on it must take both halves from the same call.
    fn snapshot(&self) -> (Arc<Vec<CatalogEntry>>, u64);

    /// Current snapshot of every entry.
    fn entries(&self) -> Arc<Vec<CatalogEntry>> {
        self.snapshot().0
    }

    fn generation(&self) -> u64 {
        self.snapshot().1
    }

    /// Entries, optionally restricted to one language.
    fn list_entries(&self, language: Option<&str>) -> Vec<CatalogEntry> {
        let entries = self.entries();
        entries
            .iter()
            .filter(|entry| language.is_none_or(|lang| entry.is_language(lang)))
            .cloned()
            .collect()
    }

    fn get(&self, id: &str) -> Option<CatalogEntry> {
        self.entries().iter().find(|entry| entry.id == id).cloned()
    }

    fn stats(&self) -> CatalogStats {
        CatalogStats::from_entries(&self.entries())
    }
}

/// Parse a JSON array of entries, normalizing each one and rejecting duplicate ids.
pub fn parse_entries(text: &str, origin: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut entries: Vec<CatalogEntry> =
        serde_json::from_str(text).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })?;

    let mut ids = AHashSet::with_capacity(entries.len());
    for entry in &mut entries {
        entry.normalize();
        if !ids.insert(entry.id.clone()) {
            return Err(CatalogError::DuplicateId(entry.id.clone()));
        }
    }
    Ok(entries)
}

/// An immutable in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    entries: Arc<Vec<CatalogEntry>>,
    generation: u64,
}

impl MemoryCatalog {
    /// Build from entries as given. Callers are responsible for id uniqueness.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
            generation: 0,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let entries = parse_entries(text, "<inline>")?;
        Ok(Self {
            entries: Arc::new(entries),
            generation: xxhash_rust::xxh3::xxh3_64(text.as_bytes()),
        })
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }
}

impl Catalog for MemoryCatalog {
    fn snapshot(&self) -> (Arc<Vec<CatalogEntry>>, u64) {
        (Arc::clone(&self.entries), self.generation)
    }
}

/// Open the catalog at `path`, or the bundled catalog when `path` is `None`.
pub fn open_catalog(path: Option<&Path>) -> Result<Arc<dyn Catalog>, CatalogError> {
    match path {
        Some(path) => Ok(Arc::new(JsonCatalog::open(path)?)),
        None => {
            let catalog = MemoryCatalog::bundled()?;
            tracing::info!("Using bundled catalog ({} entries)", catalog.entries().len());
            Ok(Arc::new(catalog))
        }
    }
}
