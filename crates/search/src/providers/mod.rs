//! Search backend implementations.

pub mod opensearch;

pub use opensearch::OpenSearchClient;
