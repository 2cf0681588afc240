//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for application plumbing.
///
/// This is an alias for `anyhow::Result`; context is added via `.context()` and
/// `.with_context()` where a catalog or config is loaded on behalf of the binary.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when loading configuration fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML for [`crate::config::Config`].
    #[error("failed to parse config {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    /// A value is outside its allowed range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
