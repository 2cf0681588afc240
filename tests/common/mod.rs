//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `bundled`: the catalog compiled into the crate
//! - `bundled_service`: a `QueryService` over the bundled catalog with default config
//!
//! [`TempCatalog`] writes catalog JSON into a temporary directory for tests that
//! exercise the file-backed catalog.

use rstest::fixture;
use snippet_mcp::config::Config;
use snippet_mcp::{Catalog, CatalogEntry, MemoryCatalog, QueryService};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Queries used by property-style tests. None of them carries a descending hint, so
/// ranked output is ordered purely by `(relevance_score, popularity)`.
#[allow(dead_code)]
pub const SAMPLE_QUERIES: &[&str] = &[
    "merge two dictionaries",
    "find the upper case",
    "sort numbers in ascending order",
    "count words in a string",
    "flatten a nested list",
    "group records by key",
    "remove duplicates from an array",
    "validate an email address",
    "parse a csv line",
    "reverse a string in javascript",
    "how do I compute the average",
    "",
];

#[fixture]
pub fn bundled() -> MemoryCatalog {
    MemoryCatalog::bundled().expect("bundled catalog parses")
}

#[fixture]
pub fn bundled_service() -> QueryService {
    let catalog: Arc<dyn Catalog> = Arc::new(bundled());
    QueryService::new(catalog, &Config::default())
}

/// A catalog file in a temporary directory.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempCatalog {
    _temp: TempDir,
    path: PathBuf,
    writes: Cell<u32>,
}

#[allow(dead_code)]
impl TempCatalog {
    /// Creates `catalog.json` holding `entries`.
    pub fn new(entries: &[CatalogEntry]) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("catalog.json");
        let catalog = Self {
            _temp: temp,
            path,
            writes: Cell::new(0),
        };
        catalog.write(entries);
        catalog
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file content and pushes its mtime forward so the change is
    /// observed even on filesystems with coarse timestamps.
    ///
    /// # Panics
    /// Panics if writing fails.
    pub fn write(&self, entries: &[CatalogEntry]) {
        let text = serde_json::to_string_pretty(entries).expect("entries serialize");
        std::fs::write(&self.path, text)
            .unwrap_or_else(|e| panic!("Failed to write '{}': {}", self.path.display(), e));
        self.touch();
    }

    fn touch(&self) {
        let writes = self.writes.get() + 1;
        self.writes.set(writes);
        let later = SystemTime::now() + Duration::from_secs(10 * u64::from(writes));
        std::fs::File::options()
            .write(true)
            .open(&self.path)
            .and_then(|file| file.set_modified(later))
            .unwrap_or_else(|e| panic!("Failed to touch '{}': {}", self.path.display(), e));
    }
}
