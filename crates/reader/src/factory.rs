//! Reader factory.

use crate::extractor::{CandidateExtractor, ExcerptReader};
use crate::oracle::SpanOracle;
use crate::providers::HttpOracle;
use crate::tokenizer::WordPieceTokenizer;
use std::sync::Arc;
use tracing::info;
use xqa_core::config::ReaderConfig;
use xqa_core::{AppError, AppResult, HighlightTags};

/// Create the span oracle described by the reader configuration.
///
/// # Errors
/// Returns `AppError::Config` if the endpoint is empty or the HTTP client
/// cannot be built.
pub fn create_oracle(config: &ReaderConfig) -> AppResult<Arc<dyn SpanOracle>> {
    if config.oracle_endpoint.trim().is_empty() {
        return Err(AppError::Config("No oracle endpoint configured".to_string()));
    }

    let oracle = HttpOracle::from_config(config)?;
    info!("Oracle: model={}, endpoint={}", oracle.model(), config.oracle_endpoint);
    Ok(Arc::new(oracle))
}

/// Create an excerpt reader from the reader configuration.
///
/// Loads the tokenizer from `tokenizerPath` and talks to the oracle at
/// `oracleEndpoint`. `tags` must match the markers the search backend puts
/// into excerpts.
///
/// # Errors
/// Returns `AppError::Config` if no tokenizer path is configured, and
/// `AppError::Tokenizer` if the tokenizer cannot be loaded.
pub fn create_reader(
    config: &ReaderConfig,
    tags: &HighlightTags,
) -> AppResult<Arc<dyn ExcerptReader>> {
    let path = config.tokenizer_path.as_ref().ok_or_else(|| {
        AppError::Config(
            "No tokenizer configured (set reader.tokenizerPath or XQA_TOKENIZER)".to_string(),
        )
    })?;

    let tokenizer = Arc::new(WordPieceTokenizer::from_file(path)?);
    let oracle = create_oracle(config)?;

    let extractor = CandidateExtractor::new(tokenizer, oracle)
        .with_max_tokens(config.max_tokens)
        .with_serialized_oracle(config.serialize_oracle)
        .with_tags(tags.clone());

    Ok(Arc::new(extractor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_create_oracle() {
        let oracle = create_oracle(&ReaderConfig::default()).unwrap();
        assert_eq!(oracle.name(), "http");
    }

    #[test]
    fn test_create_oracle_without_endpoint() {
        let config = ReaderConfig {
            oracle_endpoint: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(create_oracle(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_tokenizer_path() {
        match create_reader(&ReaderConfig::default(), &HighlightTags::default()) {
            Err(AppError::Config(msg)) => assert!(msg.contains("tokenizer")),
            Err(other) => panic!("Expected config error, got {}", other),
            Ok(_) => panic!("Expected error without a tokenizer"),
        }
    }

    #[test]
    fn test_unreadable_tokenizer() {
        let config = ReaderConfig {
            tokenizer_path: Some(PathBuf::from("/no/such/tokenizer.json")),
            ..Default::default()
        };
        assert!(matches!(
            create_reader(&config, &HighlightTags::default()),
            Err(AppError::Tokenizer(_))
        ));
    }
}
