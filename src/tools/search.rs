//! Query service shared by the CLI and the MCP tools.

use crate::cache::{CacheKey, CacheStats, SearchCache};
use crate::catalog::{Catalog, CatalogStats};
use crate::config::Config;
use crate::format::{format_code_only, format_recommendation, format_recommendations, low_relevance_warning};
use crate::search::{ScoredEntry, rank};
use crate::types::Language;
use rmcp::schemars;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Error returned for queries the service refuses to run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("unknown language '{0}' (expected one of: python, javascript, java, csharp, go, rust)")]
    UnknownLanguage(String),
}

/// Ranks catalog entries for natural-language queries, memoizing results.
pub struct QueryService {
    catalog: Arc<dyn Catalog>,
    cache: Mutex<SearchCache>,
    default_top_k: usize,
    low_relevance_threshold: f64,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("default_top_k", &self.default_top_k)
            .field("low_relevance_threshold", &self.low_relevance_threshold)
            .finish_non_exhaustive()
    }
}

impl QueryService {
    pub fn new(catalog: Arc<dyn Catalog>, config: &Config) -> Self {
        Self {
            catalog,
            cache: Mutex::new(SearchCache::new(config.cache_capacity, config.cache_ttl())),
            default_top_k: config.default_top_k,
            low_relevance_threshold: config.low_relevance_threshold,
        }
    }

    pub const fn low_relevance_threshold(&self) -> f64 {
        self.low_relevance_threshold
    }

    /// The best `top_k` entries for `query` (the configured default when `None`).
    pub async fn recommend(
        &self,
        query: &str,
        top_k: Option<usize>,
        language: Option<&str>,
    ) -> Result<Arc<Vec<ScoredEntry>>, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        let language = validate_language(language)?;
        let top_k = top_k.unwrap_or(self.default_top_k);

        let (entries, generation) = self.catalog.snapshot();
        let key = CacheKey::new(query, top_k, language.map(Language::as_str), generation);
        if let Some(cached) = self.cache.lock().await.get(&key) {
            return Ok(cached);
        }

        let results = Arc::new(rank(
            query,
            &entries,
            top_k,
            language.map(Language::as_str),
        ));
        self.cache.lock().await.insert(key, Arc::clone(&results));
        Ok(results)
    }

    /// The single best entry, or `None` when nothing matches or the best score is below
    /// `min_relevance` (ignored unless positive).
    pub async fn get_function(
        &self,
        query: &str,
        min_relevance: f64,
        language: Option<&str>,
    ) -> Result<Option<ScoredEntry>, QueryError> {
        let results = self.recommend(query, Some(1), language).await?;
        Ok(results
            .first()
            .filter(|best| min_relevance <= 0.0 || best.relevance_score >= min_relevance)
            .cloned())
    }

    pub fn stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

/// Blank filters mean "no filter"; anything else must name a known language.
fn validate_language(language: Option<&str>) -> Result<Option<Language>, QueryError> {
    match language.map(str::trim).filter(|lang| !lang.is_empty()) {
        None => Ok(None),
        Some(lang) => lang
            .parse()
            .map(Some)
            .map_err(|_| QueryError::UnknownLanguage(lang.to_string())),
    }
}

/// How results are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Banner, code and metadata
    #[default]
    Text,
    /// Code only
    Code,
    /// JSON array of results
    Json,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFunctionsRequest {
    /// Natural-language description of the task, e.g. "merge two dictionaries"
    pub query: String,
    /// Number of results to return (default: server configured, usually 5)
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Restrict results to one language: python, javascript, java, csharp, go, rust
    #[serde(default)]
    pub language: Option<String>,
    /// Drop results scoring below this value in [0, 1]
    #[serde(default)]
    pub min_relevance: Option<f64>,
    /// Output format (default: text)
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFunctionRequest {
    /// Natural-language description of the task
    pub query: String,
    /// Restrict the result to one language
    #[serde(default)]
    pub language: Option<String>,
    /// Reject the best match if it scores below this value in [0, 1]
    #[serde(default)]
    pub min_relevance: Option<f64>,
    /// Output format (default: text)
    #[serde(default)]
    pub format: OutputFormat,
}

fn render(results: &[ScoredEntry], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Text => Ok(format_recommendations(results)),
        OutputFormat::Code => Ok(format_code_only(results)),
        OutputFormat::Json => serde_json::to_string_pretty(results)
            .map_err(|e| format!("Failed to serialize results: {}", e)),
    }
}

/// Execute a multi-result search.
pub async fn handle_search_functions(
    service: &QueryService,
    request: SearchFunctionsRequest,
) -> Result<String, String> {
    let results = service
        .recommend(&request.query, request.top_k, request.language.as_deref())
        .await
        .map_err(|e| e.to_string())?;

    let min_relevance = request.min_relevance.unwrap_or(0.0);
    let results: Vec<ScoredEntry> = results
        .iter()
        .filter(|r| min_relevance <= 0.0 || r.relevance_score >= min_relevance)
        .cloned()
        .collect();

    if results.is_empty() {
        return Ok(no_match_message(&request.query));
    }
    render(&results, request.format)
}

/// Execute a best-match lookup.
pub async fn handle_get_function(
    service: &QueryService,
    request: GetFunctionRequest,
) -> Result<String, String> {
    let best = service
        .get_function(
            &request.query,
            request.min_relevance.unwrap_or(0.0),
            request.language.as_deref(),
        )
        .await
        .map_err(|e| e.to_string())?;

    let Some(best) = best else {
        return Ok(no_match_message(&request.query));
    };

    match request.format {
        OutputFormat::Text => {
            let mut output = String::new();
            if let Some(warning) =
                low_relevance_warning(best.relevance_score, service.low_relevance_threshold())
            {
                output.push_str(&warning);
                output.push_str("\n\n");
            }
            output.push_str(&format_recommendation(&best, true));
            Ok(output)
        }
        OutputFormat::Code => Ok(format_code_only(std::slice::from_ref(&best))),
        OutputFormat::Json => serde_json::to_string_pretty(&best)
            .map_err(|e| format!("Failed to serialize result: {}", e)),
    }
}

fn no_match_message(query: &str) -> String {
    format!(
        "No matching function found for '{}'.\n\n\
         Tips:\n\
         • Describe the task in plain words, e.g. \"find the maximum value in a list\"\n\
         • Name the data you work on: list, string, dictionary, number\n\
         • Drop the language filter or min_relevance to widen the search\n",
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, MemoryCatalog};
    use crate::types::{Action, DataType};
    use assert2::check;
    use rstest::rstest;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

    fn service() -> QueryService {
        let catalog = MemoryCatalog::new(vec![
            CatalogEntry::new("find_max", "find_max")
                .with_description("Finds the maximum value in a list")
                .with_code("def find_max(items):\n    return max(items)")
                .with_action(Action::Search)
                .with_data_type(DataType::List)
                .with_keywords(["find", "max", "maximum", "list"]),
            CatalogEntry::new("reverseString", "reverseString")
                .with_language("javascript")
                .with_action(Action::Reverse)
                .with_data_type(DataType::String)
                .with_keywords(["reverse", "string"]),
        ]);
        QueryService::new(Arc::new(catalog), &Config::default())
    }

    #[rstest]
    #[case(None, Ok(None))]
    #[case(Some("  "), Ok(None))]
    #[case(Some("Python"), Ok(Some(Language::Python)))]
    #[case(Some("cobol"), Err(QueryError::UnknownLanguage("cobol".to_string())))]
    fn test_validate_language(
        #[case] input: Option<&str>,
        #[case] expected: Result<Option<Language>, QueryError>,
    ) {
        check!(validate_language(input) == expected);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let result = service().recommend("  ", None, None).await;
        check!(result == Err(QueryError::EmptyQuery));
    }

    #[tokio::test]
    async fn test_recommend_uses_cache() {
        let service = service();
        let first = service.recommend("find max", None, None).await.unwrap();
        let second = service.recommend("find max", None, None).await.unwrap();
        check!(Arc::ptr_eq(&first, &second));

        let stats = service.cache_stats().await;
        check!(stats.hits == 1);
        check!(stats.misses == 1);

        service.clear_cache().await;
        let cleared = service.cache_stats().await;
        check!(cleared.entries == 0);
    }

    /// A catalog whose file is edited right after the first read.
    struct EditedAfterFirstRead {
        read: AtomicBool,
        before: Arc<Vec<CatalogEntry>>,
        after: Arc<Vec<CatalogEntry>>,
    }

    impl Catalog for EditedAfterFirstRead {
        fn snapshot(&self) -> (Arc<Vec<CatalogEntry>>, u64) {
            if self.read.swap(true, AtomicOrdering::SeqCst) {
                (Arc::clone(&self.after), 2)
            } else {
                (Arc::clone(&self.before), 1)
            }
        }
    }

    #[tokio::test]
    async fn test_results_are_cached_under_their_own_generation() {
        let catalog = EditedAfterFirstRead {
            read: AtomicBool::new(false),
            before: Arc::new(vec![CatalogEntry::new("find_min", "find_min")]),
            after: Arc::new(vec![
                CatalogEntry::new("find_min", "find_min"),
                CatalogEntry::new("find_max", "find_max"),
            ]),
        };
        let service = QueryService::new(Arc::new(catalog), &Config::default());

        let first = service.recommend("find max", None, None).await.unwrap();
        check!(first.len() == 1);

        let second = service.recommend("find max", None, None).await.unwrap();
        check!(second.len() == 2);
        check!(second[0].entry.id == "find_max");

        let stats = service.cache_stats().await;
        check!(stats.hits == 0);
        check!(stats.misses == 2);
    }

    #[tokio::test]
    async fn test_get_function_min_relevance() {
        let service = service();
        let best = service.get_function("find max", 0.0, None).await.unwrap();
        check!(best.is_some_and(|b| b.entry.id == "find_max"));

        let none = service.get_function("zebra", 0.5, None).await.unwrap();
        check!(none.is_none());
    }

    #[tokio::test]
    async fn test_handle_search_functions_json() {
        let request = SearchFunctionsRequest {
            query: "find max".to_string(),
            top_k: Some(1),
            language: None,
            min_relevance: None,
            format: OutputFormat::Json,
        };
        let text = handle_search_functions(&service(), request).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        check!(json[0]["id"] == "find_max");
        check!(json[0]["relevance_score"] == 1.0);
    }

    #[tokio::test]
    async fn test_handle_get_function_unknown_language() {
        let request = GetFunctionRequest {
            query: "find max".to_string(),
            language: Some("fortran".to_string()),
            min_relevance: None,
            format: OutputFormat::Text,
        };
        let err = handle_get_function(&service(), request).await.unwrap_err();
        check!(err.contains("fortran"));
    }

    #[tokio::test]
    async fn test_handle_get_function_no_match() {
        let request = GetFunctionRequest {
            query: "find max".to_string(),
            language: Some("rust".to_string()),
            min_relevance: None,
            format: OutputFormat::Text,
        };
        let text = handle_get_function(&service(), request).await.unwrap();
        check!(text.starts_with("No matching function found"));
    }
}
