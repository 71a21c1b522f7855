//! Answer aggregation for XQA.
//!
//! Ties retrieval and reading together: every highlighted excerpt of every
//! retrieved article is read, "no answer" candidates are dropped, and the
//! rest are ranked by score. Each top-level request gets a sequence number
//! for log correlation.
//!
//! # Example
//! ```no_run
//! use xqa_answer::{AnswerOptions, ExtractiveQa};
//! use xqa_core::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let qa = ExtractiveQa::connect(&config).await?;
//! let response = qa
//!     .answer("When was Ohio State founded", &AnswerOptions::default())
//!     .await?;
//! if let Some(best) = response.answer {
//!     println!("#{}: {}", response.request_id, best.answer);
//! }
//! qa.close();
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod rank;
pub mod sequencer;
pub mod types;


// Re-export main types
pub use pipeline::{normalize_question, ExtractiveQa};
pub use rank::{collect_candidates, filter_and_rank};
pub use sequencer::RequestSequencer;
pub use types::{AnswerOptions, CandidateAnswer, CandidateSet, QaResponse};
