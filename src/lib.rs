//! Recommends reusable code snippets for tasks described in plain language.
//!
//! The [`search`] module holds the deterministic ranking engine; [`catalog`] supplies
//! the entries it ranks, and [`tools`] wraps both in a cached query service used by the
//! CLI and the MCP [`server`].

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;
pub mod types;

pub use catalog::{Catalog, CatalogEntry, JsonCatalog, MemoryCatalog};
pub use search::{Intent, ScoredEntry, parse_intent, rank, score};
pub use server::SnippetServer;
pub use tools::search::{QueryError, QueryService};
