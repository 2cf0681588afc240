//! MCP server exposing the query service as tools.

use crate::format::format_stats;
use crate::tools::search::{
    GetFunctionRequest, QueryService, SearchFunctionsRequest, handle_get_function,
    handle_search_functions,
};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP server for code snippet lookups
#[derive(Clone)]
pub struct SnippetServer {
    service: Arc<QueryService>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SnippetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetServer")
            .field("service", &self.service)
            .finish()
    }
}

#[tool_router]
impl SnippetServer {
    pub fn new(service: Arc<QueryService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Find reusable code snippets for a task described in plain language. Returns the best matches ranked by relevance, optionally restricted to one programming language.",
        input_schema = inline_schema_for_type::<SearchFunctionsRequest>()
    )]
    async fn search_functions(
        &self,
        Parameters(request): Parameters<SearchFunctionsRequest>,
    ) -> std::result::Result<String, String> {
        handle_search_functions(&self.service, request).await
    }

    #[tool(
        description = "Get the single best code snippet for a task described in plain language, with its description, usage example and relevance. Warns when the match is weak.",
        input_schema = inline_schema_for_type::<GetFunctionRequest>()
    )]
    async fn get_function(
        &self,
        Parameters(request): Parameters<GetFunctionRequest>,
    ) -> std::result::Result<String, String> {
        handle_get_function(&self.service, request).await
    }

    #[tool(description = "Show how many snippets the catalog holds per language, plus search cache counters.")]
    async fn catalog_stats(&self) -> std::result::Result<String, String> {
        let cache = self.service.cache_stats().await;
        Ok(format_stats(&self.service.stats(), Some(&cache)))
    }
}

#[tool_handler]
impl ServerHandler for SnippetServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "snippet-mcp: finds ready-to-use code snippets from plain-language task descriptions. \
                 Use get_function for the single best match, search_functions to compare several, \
                 and catalog_stats to see which languages are available.",
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// so enums such as the output format render inline instead of as `$ref`s.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let serde_json::Value::Object(json_object) = object else {
        panic!("Schema serialization produced non-object value");
    };

    Arc::new(json_object)
}
