//! Retrieval client abstraction and request/response types.

use serde::{Deserialize, Serialize};
use xqa_core::AppResult;

/// Default number of articles to retrieve.
pub const DEFAULT_LIMIT: usize = 4;

/// Default highlight fragment size in characters.
pub const DEFAULT_FRAGMENT_SIZE: usize = 250;

/// Full-text retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The phrase (usually the question itself) to match
    pub query: String,

    /// Maximum number of article hits to return
    pub limit: usize,

    /// Character budget of each highlight fragment
    pub fragment_size: usize,
}

impl SearchRequest {
    /// Create a new request with the default limit and fragment size.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_LIMIT,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
        }
    }

    /// Set the maximum number of hits.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the highlight fragment size.
    pub fn with_fragment_size(mut self, fragment_size: usize) -> Self {
        self.fragment_size = fragment_size;
        self
    }
}

/// One retrieved article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleHit {
    /// Relevance score assigned by the backend
    pub score: f32,

    /// Article identifier, unique within the index
    pub id: u64,

    /// Article title
    pub title: String,

    /// Highlighted body fragments, in backend order.
    /// Matched terms are wrapped in emphasis markers.
    pub highlights: Vec<String>,
}

/// Trait for retrieval backends.
///
/// Implementations must rank title matches at least as high as body matches
/// and return highlight fragments no longer than the requested size.
/// Calls are safe to issue concurrently.
#[async_trait::async_trait]
pub trait SearchClient: Send + Sync {
    /// Get the provider name (e.g., "opensearch").
    fn provider_name(&self) -> &str;

    /// Verify the backend is reachable and the article index exists.
    ///
    /// # Errors
    /// * `RetrievalUnavailable` if the backend cannot be reached
    /// * `IndexNotReady` if the index does not exist
    async fn connect(&self) -> AppResult<()>;

    /// Run a full-text query and return at most `request.limit` hits.
    ///
    /// An empty result is not an error.
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<ArticleHit>>;

    /// Create the article index if it does not exist yet.
    async fn ensure_index(&self) -> AppResult<()>;
}
