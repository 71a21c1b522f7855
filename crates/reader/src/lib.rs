//! Reading-comprehension crate for XQA.
//!
//! Turns a (question, excerpt) pair into a single scored candidate answer:
//! the excerpt is stripped of highlight markup, tokenized together with the
//! question, scored by a span-extraction oracle, and the best span is decoded
//! back into readable text.
//!
//! The oracle is an opaque capability behind [`SpanOracle`]; the
//! tokenizer sits behind [`PairTokenizer`]. Both have mock implementations
//! so the extractor can be exercised without a model.

pub mod extractor;
pub mod factory;
pub mod oracle;
pub mod providers;
pub mod tokenizer;
pub mod types;

// Re-export main types
pub use extractor::{CandidateExtractor, ExcerptReader};
pub use factory::{create_oracle, create_reader};
pub use oracle::SpanOracle;
pub use providers::{HttpOracle, MockOracle};
pub use tokenizer::{MockTokenizer, PairTokenizer, SpecialTokens, WordPieceTokenizer};
pub use types::{resolve_model_name, Extraction, ModelInput, ModelSize, Span, SpanScores};
