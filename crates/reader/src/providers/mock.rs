//! Mock span oracle for testing and development.

use crate::oracle::SpanOracle;
use crate::types::{ModelInput, SpanScores};
use std::sync::atomic::{AtomicUsize, Ordering};
use xqa_core::AppResult;

/// Score given to positions the mock does not point at.
const BACKGROUND_SCORE: f32 = -5.0;

type Scorer = dyn Fn(&ModelInput) -> SpanScores + Send + Sync;

/// Deterministic oracle driven by a scoring closure.
pub struct MockOracle {
    scorer: Box<Scorer>,
    calls: AtomicUsize,
}

impl MockOracle {
    /// Create a mock from an arbitrary scoring function.
    pub fn new<F>(scorer: F) -> Self
    where
        F: Fn(&ModelInput) -> SpanScores + Send + Sync + 'static,
    {
        Self {
            scorer: Box::new(scorer),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always peak at `start` and `end` with score `peak`.
    ///
    /// Positions past the end of the input are clamped to the last token.
    pub fn pointing_at(start: usize, end: usize, peak: f32) -> Self {
        Self::new(move |input| {
            let last = input.len().saturating_sub(1);
            SpanScores {
                start_logits: peaked(input.len(), start.min(last), peak),
                end_logits: peaked(input.len(), end.min(last), peak),
            }
        })
    }

    /// Peak at the first passage-side occurrence of `token_id`.
    ///
    /// When the token is absent the mock points at position 0, the
    /// start-of-sequence marker, meaning "no answer".
    pub fn targeting(token_id: u32, peak: f32) -> Self {
        Self::new(move |input| {
            let position = input
                .input_ids
                .iter()
                .zip(&input.segment_ids)
                .position(|(&id, &segment)| segment == 1 && id == token_id)
                .unwrap_or(0);
            SpanScores {
                start_logits: peaked(input.len(), position, peak),
                end_logits: peaked(input.len(), position, peak),
            }
        })
    }

    /// Number of times `score` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A distribution that is flat except for one position.
fn peaked(len: usize, position: usize, peak: f32) -> Vec<f32> {
    let mut scores = vec![BACKGROUND_SCORE; len];
    if let Some(slot) = scores.get_mut(position) {
        *slot = peak;
    }
    scores
}

#[async_trait::async_trait]
impl SpanOracle for MockOracle {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, input: &ModelInput) -> AppResult<SpanScores> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.scorer)(input))
    }
}
