//! XQA Core Library
//!
//! This crate provides the foundational utilities shared by the extractive
//! question answering workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Shared types (highlight markers)

pub mod config;
pub mod error;
pub mod highlight;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use highlight::HighlightTags;
