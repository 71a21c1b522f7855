//! Answer types.

use serde::{Deserialize, Serialize};
use std::fmt;
use xqa_core::config::AnswerDefaults;
use xqa_search::client::{DEFAULT_FRAGMENT_SIZE, DEFAULT_LIMIT};
use xqa_search::SearchRequest;

/// A scored answer read from one excerpt of one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnswer {
    /// Id of the article the excerpt came from
    pub article_id: u64,

    /// Title of that article
    pub article_title: String,

    /// The highlighted excerpt, as returned by retrieval
    pub excerpt: String,

    /// Reconstructed answer text
    pub answer: String,

    /// Mean of the best start and end scores
    pub score: f32,
}

impl fmt::Display for CandidateAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PossibleAnswer: score={} answer=\"{}\"",
            self.score, self.answer
        )
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptions {
    /// Number of articles to retrieve
    pub n: usize,

    /// Highlight fragment size in characters
    pub fragment_size: usize,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            n: DEFAULT_LIMIT,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
        }
    }
}

impl From<&AnswerDefaults> for AnswerOptions {
    fn from(defaults: &AnswerDefaults) -> Self {
        Self {
            n: defaults.n,
            fragment_size: defaults.fragment_size,
        }
    }
}

impl AnswerOptions {
    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    pub fn with_fragment_size(mut self, fragment_size: usize) -> Self {
        self.fragment_size = fragment_size;
        self
    }

    /// Build the retrieval request for `question`.
    pub fn search_request(&self, question: &str) -> SearchRequest {
        SearchRequest::new(question)
            .with_limit(self.n)
            .with_fragment_size(self.fragment_size)
    }
}

/// Every candidate read for a question, before filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    /// Candidates in retrieval order (hit by hit, excerpt by excerpt)
    pub candidates: Vec<CandidateAnswer>,

    /// Number of excerpts whose extraction failed
    pub failures: usize,
}

/// Result of one top-level answer request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    /// Sequence number of this request
    pub request_id: u64,

    /// Best answer, or `None` when nothing survived ranking
    pub answer: Option<CandidateAnswer>,
}

impl QaResponse {
    pub fn has_answer(&self) -> bool {
        self.answer.is_some()
    }
}
