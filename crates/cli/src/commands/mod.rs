//! Command handlers for the XQA CLI.

pub mod ask;
pub mod index;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use index::IndexCommand;
