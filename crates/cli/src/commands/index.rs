//! Index command handlers.

use clap::{Args, Subcommand};
use xqa_core::{config::AppConfig, AppResult};
use xqa_search::create_client;

/// Article index management
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub command: IndexSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum IndexSubcommand {
    /// Create the article index if it does not exist
    Init,

    /// Check that the search backend is reachable and the index exists
    Check,
}

impl IndexCommand {
    /// Execute the index command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = create_client(&config.search)?;

        match self.command {
            IndexSubcommand::Init => {
                tracing::info!("Initializing index '{}'", config.search.index);
                client.ensure_index().await?;
                println!(
                    "Index '{}' is ready at {}",
                    config.search.index, config.search.endpoint
                );
            }
            IndexSubcommand::Check => {
                client.connect().await?;
                println!(
                    "{} at {} is reachable; index '{}' exists",
                    client.provider_name(),
                    config.search.endpoint,
                    config.search.index
                );
            }
        }

        Ok(())
    }
}
