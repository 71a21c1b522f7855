//! Span-extraction oracle implementations.

pub mod http;
pub mod mock;

pub use http::HttpOracle;
pub use mock::MockOracle;
