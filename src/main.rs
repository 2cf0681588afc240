use anyhow::Context;
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use snippet_mcp::cli::{Cli, Commands};
use snippet_mcp::config::Config;
use snippet_mcp::format::{
    format_code_only, format_recommendation, format_recommendations, format_stats,
    low_relevance_warning,
};
use snippet_mcp::search::ScoredEntry;
use snippet_mcp::{QueryService, SnippetServer, catalog::open_catalog, error::Result};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    snippet_mcp::tracing::init(cli.verbose);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_catalog_override(cli.catalog.map(|path| path.to_string_lossy().into_owned()));

    let catalog = open_catalog(config.catalog.as_deref()).context("Failed to open catalog")?;
    let service = Arc::new(QueryService::new(catalog, &config));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(service).await,
        Commands::Stats => {
            print!("{}", format_stats(&service.stats(), None));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Query {
            text,
            top,
            lang,
            json,
            code_only,
            min_relevance,
        } => {
            let output = QueryOutput { json, code_only };
            if top == 1 {
                best_match(&service, &text, lang.as_deref(), min_relevance, output).await
            } else {
                recommendations(&service, &text, top, lang.as_deref(), min_relevance, output).await
            }
        }
    }
}

async fn serve(service: Arc<QueryService>) -> Result<ExitCode> {
    tracing::info!("Starting snippet-mcp MCP server");

    let server = SnippetServer::new(service);
    let running = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;
    running.waiting().await?;

    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Clone, Copy)]
struct QueryOutput {
    json: bool,
    code_only: bool,
}

async fn best_match(
    service: &QueryService,
    text: &str,
    lang: Option<&str>,
    min_relevance: f64,
    output: QueryOutput,
) -> Result<ExitCode> {
    let Some(best) = service.get_function(text, min_relevance, lang).await? else {
        eprintln!("No matching function found. Try rephrasing your query.");
        return Ok(ExitCode::FAILURE);
    };

    if !output.code_only
        && let Some(warning) =
            low_relevance_warning(best.relevance_score, service.low_relevance_threshold())
    {
        eprintln!("\n{}\n", warning);
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(&best)?);
    } else if output.code_only {
        print!("{}", format_code_only(std::slice::from_ref(&best)));
    } else {
        print!("{}", format_recommendation(&best, true));
    }
    Ok(ExitCode::SUCCESS)
}

async fn recommendations(
    service: &QueryService,
    text: &str,
    top: usize,
    lang: Option<&str>,
    min_relevance: f64,
    output: QueryOutput,
) -> Result<ExitCode> {
    let results: Vec<ScoredEntry> = service
        .recommend(text, Some(top), lang)
        .await?
        .iter()
        .filter(|r| min_relevance <= 0.0 || r.relevance_score >= min_relevance)
        .cloned()
        .collect();

    if results.is_empty() {
        eprintln!("No matching functions found. Try rephrasing your query.");
        return Ok(ExitCode::FAILURE);
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if output.code_only {
        print!("{}", format_code_only(&results));
    } else {
        print!("{}", format_recommendations(&results));
    }
    Ok(ExitCode::SUCCESS)
}
