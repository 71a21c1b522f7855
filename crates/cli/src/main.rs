//! XQA CLI
//!
//! Main entry point for the xqa command-line tool.
//! Answers questions from a search index with a span-extraction model.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IndexCommand};
use std::path::PathBuf;
use xqa_core::{config::AppConfig, logging, AppResult};

/// XQA - extractive question answering over a search index
#[derive(Parser, Debug)]
#[command(name = "xqa")]
#[command(about = "Extractive question answering over a search index", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "XQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Search cluster URL
    #[arg(long, global = true, env = "XQA_SEARCH_URL")]
    search_url: Option<String>,

    /// Article index name
    #[arg(long, global = true, env = "XQA_INDEX")]
    index: Option<String>,

    /// Model size (small, medium, large) or full identifier
    #[arg(short, long, global = true, env = "XQA_MODEL")]
    model: Option<String>,

    /// Span-extraction endpoint
    #[arg(long, global = true, env = "XQA_ORACLE_URL")]
    oracle_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question from the indexed articles
    Ask(AskCommand),

    /// Article index management
    Index(IndexCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration; an explicit --config wins over the environment
    let config_path = cli.config.clone();
    let config = AppConfig::load_with(|key| match (key, &config_path) {
        ("XQA_CONFIG", Some(path)) => Some(path.display().to_string()),
        _ => std::env::var(key).ok(),
    })?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.search_url,
        cli.index,
        cli.model,
        cli.oracle_url,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("XQA CLI starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!(
        "Search: {} ({})",
        config.search.endpoint,
        config.search.index
    );
    tracing::debug!("Model: {}", config.reader.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Index(_) => "index",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
