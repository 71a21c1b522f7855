//! Span-extraction oracle abstraction.

use crate::types::{ModelInput, SpanScores};
use xqa_core::AppResult;

/// Trait for span-extraction models.
///
/// Given token ids and segment tags, an oracle returns one start score and
/// one end score per input position. How it computes them is opaque to the
/// rest of the system.
#[async_trait::async_trait]
pub trait SpanOracle: Send + Sync {
    /// Get the oracle name (e.g., "http", "mock").
    fn name(&self) -> &str;

    /// Score every position of `input` as a possible answer start and end.
    ///
    /// # Errors
    /// * `OracleUnavailable` if the inference backend cannot be reached
    /// * `Inference` if it answers with something unusable
    async fn score(&self, input: &ModelInput) -> AppResult<SpanScores>;
}
