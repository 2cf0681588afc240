//! File-backed catalog that picks up edits to the JSON file without a restart.

use super::{Catalog, CatalogEntry, CatalogError, parse_entries};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant, SystemTime};
use xxhash_rust::xxh3::xxh3_64;

/// Minimum time between mtime checks.
const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Snapshot {
    entries: Arc<Vec<CatalogEntry>>,
    /// xxh3 of the file bytes the entries were parsed from
    content_hash: u64,
    mtime: Option<SystemTime>,
    checked_at: Instant,
}

/// A catalog read from a JSON array on disk.
///
/// The file is re-read when its modification time changes, checked at most once per
/// [`REFRESH_INTERVAL`]. A reload that fails keeps serving the previous snapshot.
#[derive(Debug)]
pub struct JsonCatalog {
    path: PathBuf,
    refresh_interval: Duration,
    snapshot: RwLock<Snapshot>,
}

impl JsonCatalog {
    /// Load the catalog at `path`. Fails if the initial read or parse fails.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let snapshot = read_snapshot(&path)?;
        tracing::info!(
            "Loaded {} catalog entries from {}",
            snapshot.entries.len(),
            path.display()
        );
        Ok(Self {
            path,
            refresh_interval: REFRESH_INTERVAL,
            snapshot: RwLock::new(snapshot),
        })
    }

    /// Override how often the file's mtime is checked.
    pub const fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Re-read the file if it changed since the last load.
    fn refresh_if_stale(&self) {
        {
            let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            if snapshot.checked_at.elapsed() < self.refresh_interval {
                return;
            }
        }

        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another caller may have refreshed while we waited for the write lock
        if snapshot.checked_at.elapsed() < self.refresh_interval {
            return;
        }
        snapshot.checked_at = Instant::now();

        let mtime = file_mtime(&self.path);
        if mtime.is_some() && mtime == snapshot.mtime {
            return;
        }

        match read_snapshot(&self.path) {
            Ok(fresh) => {
                if fresh.content_hash != snapshot.content_hash {
                    tracing::info!(
                        "Reloaded catalog {} ({} entries)",
                        self.path.display(),
                        fresh.entries.len()
                    );
                }
                *snapshot = fresh;
            }
            Err(err) => {
                tracing::warn!("Keeping previous catalog snapshot: {}", err);
                snapshot.mtime = mtime;
            }
        }
    }
}

impl Catalog for JsonCatalog {
    fn snapshot(&self) -> (Arc<Vec<CatalogEntry>>, u64) {
        self.refresh_if_stale();
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        (Arc::clone(&snapshot.entries), snapshot.content_hash)
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_snapshot(path: &Path) -> Result<Snapshot, CatalogError> {
    let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let entries = parse_entries(&text, &path.display().to_string())?;

    Ok(Snapshot {
        entries: Arc::new(entries),
        content_hash: xxh3_64(&bytes),
        mtime: file_mtime(path),
        checked_at: Instant::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::fs;
    use tempfile::TempDir;

    const ONE_ENTRY: &str = r#"[{"id": "find_max", "name": "find_max"}]"#;
    const TWO_ENTRIES: &str =
        r#"[{"id": "find_max", "name": "find_max"}, {"id": "find_min", "name": "find_min"}]"#;

    #[test]
    fn test_open_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let result = JsonCatalog::open(temp.path().join("nope.json"));
        check!(matches!(result, Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_reload_on_change() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        fs::write(&path, ONE_ENTRY).unwrap();

        let catalog = JsonCatalog::open(&path)
            .unwrap()
            .with_refresh_interval(Duration::ZERO);
        let first_generation = catalog.generation();
        check!(catalog.entries().len() == 1);

        // Force a distinct mtime even on filesystems with coarse timestamps
        fs::write(&path, TWO_ENTRIES).unwrap();
        let later = SystemTime::now() + Duration::from_secs(10);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        check!(catalog.entries().len() == 2);
        check!(catalog.generation() != first_generation);
    }

    #[test]
    fn test_snapshot_pairs_entries_with_their_hash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        fs::write(&path, ONE_ENTRY).unwrap();

        let catalog = JsonCatalog::open(&path)
            .unwrap()
            .with_refresh_interval(Duration::ZERO);
        let (entries, generation) = catalog.snapshot();
        check!(entries.len() == 1);
        check!(generation == xxh3_64(ONE_ENTRY.as_bytes()));

        fs::write(&path, TWO_ENTRIES).unwrap();
        let later = SystemTime::now() + Duration::from_secs(10);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let (entries, generation) = catalog.snapshot();
        check!(entries.len() == 2);
        check!(generation == xxh3_64(TWO_ENTRIES.as_bytes()));
    }

    #[test]
    fn test_broken_reload_keeps_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        fs::write(&path, ONE_ENTRY).unwrap();

        let catalog = JsonCatalog::open(&path)
            .unwrap()
            .with_refresh_interval(Duration::ZERO);
        let generation = catalog.generation();

        fs::write(&path, "[{broken").unwrap();
        let later = SystemTime::now() + Duration::from_secs(10);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        check!(catalog.entries().len() == 1);
        check!(catalog.generation() == generation);
    }
}
