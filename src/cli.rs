use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "snippet-mcp", version)]
#[command(
    about = "Find reusable code snippets from plain-language task descriptions",
    long_about = None,
    after_help = "Examples:\n  \
        snippet-mcp query \"sort a list in descending order and remove duplicates\"\n  \
        snippet-mcp query \"merge two dictionaries\" --top 3\n  \
        snippet-mcp query \"find maximum value in list\" --code-only"
)]
pub struct Cli {
    /// Config file (default: <config dir>/snippet-mcp/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog JSON file, overriding config and SNIPPET_MCP_CATALOG
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Recommend snippets for a task description
    Query {
        /// What the code should do, in plain words
        text: String,
        /// Number of recommendations
        #[arg(short = 'n', long, default_value_t = 1)]
        top: usize,
        /// Only consider snippets in this language
        #[arg(short, long)]
        lang: Option<String>,
        /// Print results as JSON
        #[arg(long, conflicts_with = "code_only")]
        json: bool,
        /// Print only the code
        #[arg(long)]
        code_only: bool,
        /// Drop results scoring below this value in [0, 1]
        #[arg(long, default_value_t = 0.0)]
        min_relevance: f64,
    },
    /// Show catalog counts per language
    Stats,
    /// Serve the MCP tools over stdio (the default)
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["snippet-mcp"]).unwrap();
        check!(cli.command.is_none());
    }

    #[test]
    fn test_query_arguments() {
        let cli = Cli::try_parse_from([
            "snippet-mcp",
            "query",
            "merge two dictionaries",
            "--top",
            "3",
            "--lang",
            "python",
            "--json",
            "--catalog",
            "/tmp/catalog.json",
        ])
        .unwrap();

        check!(cli.catalog == Some(PathBuf::from("/tmp/catalog.json")));
        let Some(Commands::Query {
            text,
            top,
            lang,
            json,
            code_only,
            min_relevance,
        }) = cli.command
        else {
            panic!("expected query subcommand");
        };
        check!(text == "merge two dictionaries");
        check!(top == 3);
        check!(lang.as_deref() == Some("python"));
        check!(json);
        check!(!code_only);
        check!(min_relevance == 0.0);
    }

    #[test]
    fn test_json_conflicts_with_code_only() {
        let result = Cli::try_parse_from(["snippet-mcp", "query", "x", "--json", "--code-only"]);
        check!(result.is_err());
    }
}
