//! Retrieval crate for XQA.
//!
//! Provides a backend-agnostic abstraction over full-text search clusters
//! that return ranked article hits with highlighted text fragments.
//!
//! # Providers
//! - **OpenSearch** (default)
//! - **Elasticsearch** (same wire format)
//!
//! # Example
//! ```no_run
//! use xqa_search::{SearchClient, SearchRequest, providers::OpenSearchClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenSearchClient::new("http://localhost:9200", "articles");
//! let request = SearchRequest::new("When was Ohio State founded?").with_limit(4);
//! for hit in client.search(&request).await? {
//!     println!("{} ({:.2}): {} fragments", hit.title, hit.score, hit.highlights.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{ArticleHit, SearchClient, SearchRequest};
pub use factory::create_client;
pub use providers::OpenSearchClient;
