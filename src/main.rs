mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gauzmem::config::{default_config_path, GauzConfig};
use gauzmem::summary::Language;

#[derive(Parser)]
#[command(name = "gauzmem", version, about = "Terminal console for the GauzMem memory backend")]
struct Cli {
    /// Config file (defaults to ~/.gauzmem/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the API base URL for this invocation
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Override the project id for this invocation
    #[arg(long, global = true)]
    project: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check backend health
    Health,
    /// Show the dashboard overview
    Stats,
    /// List extracted facts
    Facts {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Sort order passed to the backend
        #[arg(long, default_value = "uncomfortable_desc")]
        sort: String,
        /// Minimum uncomfortable score
        #[arg(long, default_value = "0")]
        min_score: String,
        /// Show facts not attached to any relation
        #[arg(long)]
        unresolved: bool,
    },
    /// List chunks, or the facts of one chunk
    Chunks {
        #[arg(long)]
        id: Option<i64>,
    },
    /// List relation subgraphs
    Subgraphs {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Build and render the graph of subgraph #INDEX
    Graph {
        index: usize,
        #[arg(long, value_enum, default_value_t = cli::subgraphs::GraphFormat::Text)]
        format: cli::subgraphs::GraphFormat,
    },
    /// Summarize subgraph #INDEX into a memory paragraph
    Summarize { index: usize },
    /// Hybrid search over facts and chunks
    Search { query: String },
    /// Natural-language recall for a query
    Recall { query: String },
    /// Chat with memory recall
    Chat,
    /// Flush the backend's source buffer
    Flush,
    /// Set the display language (en or zh)
    Lang { language: Language },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = GauzConfig::load_from(&config_path)?;
    if let Some(base) = cli.api_base {
        config.api.base_url = base;
    }
    if let Some(project) = cli.project {
        config.api.project_id = project;
    }

    // Log to stderr so stdout only carries command output.
    let filter = EnvFilter::try_new(&config.console.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Health => cli::stats::health(&config).await?,
        Command::Stats => cli::stats::stats(&config).await?,
        Command::Facts {
            page,
            sort,
            min_score,
            unresolved,
        } => cli::facts::facts(&config, page, &sort, &min_score, unresolved).await?,
        Command::Chunks { id } => cli::facts::chunks(&config, id).await?,
        Command::Subgraphs { page } => cli::subgraphs::subgraphs(&config, page).await?,
        Command::Graph { index, format } => cli::subgraphs::graph(&config, index, format).await?,
        Command::Summarize { index } => cli::subgraphs::summarize(&config, index).await?,
        Command::Search { query } => cli::search::search(&config, &query).await?,
        Command::Recall { query } => cli::search::recall(&config, &query).await?,
        Command::Chat => cli::chat::chat(&config).await?,
        Command::Flush => cli::chat::flush(&config).await?,
        Command::Lang { language } => cli::lang(&config_path, language)?,
    }

    Ok(())
}
