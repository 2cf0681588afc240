//! Runtime configuration loaded from TOML.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the configured catalog path.
pub const CATALOG_ENV: &str = "SNIPPET_MCP_CATALOG";

const APP_DIR: &str = "snippet-mcp";
const CONFIG_FILE: &str = "config.toml";

/// Settings shared by the CLI and the MCP server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// JSON catalog file. The bundled catalog is used when unset.
    pub catalog: Option<PathBuf>,
    /// Lifetime of a cached search result
    pub cache_ttl_secs: u64,
    /// Maximum number of cached searches
    pub cache_capacity: usize,
    /// Result count when a caller does not ask for one
    pub default_top_k: usize,
    /// Top scores below this produce a low-relevance warning
    pub low_relevance_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            cache_ttl_secs: 300,
            cache_capacity: 256,
            default_top_k: 5,
            low_relevance_threshold: 0.4,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.catalog = config.catalog.map(|path| expand_tilde(&path));
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the per-user config file is read when
    /// present, and defaults are used when it is not. [`CATALOG_ENV`] is applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::read(&expand_tilde(path))?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config.with_catalog_override(std::env::var(CATALOG_ENV).ok()))
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loading config from {}", path.display());
        Self::from_toml(&text, &path.display().to_string())
    }

    /// Replace the catalog path when `catalog` is set and non-blank.
    #[must_use]
    pub fn with_catalog_override(mut self, catalog: Option<String>) -> Self {
        if let Some(path) = catalog.filter(|path| !path.trim().is_empty()) {
            self.catalog = Some(expand_tilde(Path::new(path.trim())));
        }
        self
    }

    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.default_top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "default_top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.low_relevance_threshold) {
            return Err(ConfigError::Invalid {
                field: "low_relevance_threshold",
                reason: format!("{} is outside [0, 1]", self.low_relevance_threshold),
            });
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/snippet-mcp/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Expands a leading `~` in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_is_default() {
        check!(Config::from_toml("", "test").unwrap() == Config::default());
    }

    #[test]
    fn test_partial_document() {
        let config = Config::from_toml("default_top_k = 3\ncache_ttl_secs = 10", "test").unwrap();
        check!(config.default_top_k == 3);
        check!(config.cache_ttl() == Duration::from_secs(10));
        check!(config.cache_capacity == 256);
    }

    #[rstest]
    #[case("cache_capacity = 0", "cache_capacity")]
    #[case("default_top_k = 0", "default_top_k")]
    #[case("low_relevance_threshold = 1.5", "low_relevance_threshold")]
    fn test_invalid_values(#[case] text: &str, #[case] expected_field: &str) {
        let err = Config::from_toml(text, "test").unwrap_err();
        check!(matches!(err, ConfigError::Invalid { field, .. } if field == expected_field));
    }

    #[rstest]
    #[case("catalogue = 'x.json'")]
    #[case("default_top_k = 'five'")]
    fn test_parse_errors(#[case] text: &str) {
        check!(matches!(
            Config::from_toml(text, "test"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_catalog_override() {
        let config = Config::default().with_catalog_override(Some("/tmp/catalog.json".into()));
        check!(config.catalog == Some(PathBuf::from("/tmp/catalog.json")));

        let unchanged = config.clone().with_catalog_override(Some("  ".into()));
        check!(unchanged == config);
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "default_top_k = 7").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        check!(config.default_top_k == 7);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(&temp.path().join("missing.toml")));
        check!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        check!(expand_tilde(Path::new("~/foo/bar")) == home.join("foo/bar"));
        check!(expand_tilde(Path::new("~")) == home);
        check!(expand_tilde(Path::new("/abs/path")) == PathBuf::from("/abs/path"));
        check!(expand_tilde(Path::new("~user/x")) == PathBuf::from("~user/x"));
    }
}
