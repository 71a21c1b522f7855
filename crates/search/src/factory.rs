//! Search client factory.
//!
//! Builds a retrieval client from the search section of the configuration.

use crate::client::SearchClient;
use crate::providers::OpenSearchClient;
use std::sync::Arc;
use xqa_core::config::SearchConfig;
use xqa_core::{AppError, AppResult};

/// Create a search client based on the configured provider.
///
/// OpenSearch and Elasticsearch share the `_search` and highlight APIs used
/// here, so both resolve to [`OpenSearchClient`].
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the HTTP client
/// cannot be built.
pub fn create_client(config: &SearchConfig) -> AppResult<Arc<dyn SearchClient>> {
    match config.provider.to_lowercase().as_str() {
        "opensearch" | "elasticsearch" => {
            let client = OpenSearchClient::from_config(config)?;
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown search provider: {}",
            config.provider
        ))),
    }
}
