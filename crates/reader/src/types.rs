//! Reader types: model selection, model input, oracle output.

use serde::{Deserialize, Serialize};
use xqa_core::{AppError, AppResult};

/// Most models cannot accept more input tokens than this.
pub const MAX_TOKENS: usize = 512;

/// Pre-trained span-extraction model sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ModelSize {
    /// Every size, smallest first.
    pub const ALL: [ModelSize; 3] = [ModelSize::Small, ModelSize::Medium, ModelSize::Large];

    /// Parse a size nickname (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    /// Get the canonical nickname.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Full model identifier for this size.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Small => "mrm8488/bert-tiny-finetuned-squadv2",
            Self::Medium => "mrm8488/bert-medium-finetuned-squadv2",
            Self::Large => "bert-large-uncased-whole-word-masking-finetuned-squad",
        }
    }
}

/// Resolve a nickname to its model identifier; anything else passes through.
pub fn resolve_model_name(name: &str) -> String {
    match ModelSize::parse(name) {
        Some(size) => size.identifier().to_string(),
        None => name.trim().to_string(),
    }
}

/// Token ids and segment tags fed to the oracle.
///
/// Segment 0 covers every token up to and including the first separator
/// (the question side); segment 1 covers the rest (the passage side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInput {
    pub input_ids: Vec<u32>,
    pub segment_ids: Vec<u8>,
}

impl ModelInput {
    /// Truncate `ids` to `max_tokens` and derive segment tags.
    ///
    /// Only trailing passage tokens are dropped. The question and the
    /// separator that closes it always survive.
    ///
    /// # Errors
    /// `MalformedInput` if there is no separator, or if the question side
    /// alone does not fit in the budget.
    pub fn build(mut ids: Vec<u32>, sep_id: u32, max_tokens: usize) -> AppResult<Self> {
        let sep_index = ids.iter().position(|&id| id == sep_id).ok_or_else(|| {
            AppError::MalformedInput("no separator token in encoded input".to_string())
        })?;

        if sep_index >= max_tokens {
            return Err(AppError::MalformedInput(format!(
                "question spans {} tokens, budget is {}",
                sep_index + 1,
                max_tokens
            )));
        }

        ids.truncate(max_tokens);

        // The question segment includes the separator itself
        let num_seg_a = sep_index + 1;
        let segment_ids = (0..ids.len())
            .map(|i| if i < num_seg_a { 0 } else { 1 })
            .collect();

        Ok(Self {
            input_ids: ids,
            segment_ids,
        })
    }

    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Index of the first passage-side token, if any survived truncation.
    pub fn passage_start(&self) -> Option<usize> {
        self.segment_ids.iter().position(|&s| s == 1)
    }
}

/// Per-position start and end scores returned by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanScores {
    pub start_logits: Vec<f32>,
    pub end_logits: Vec<f32>,
}

impl SpanScores {
    /// Check both distributions line up with an input of `len` tokens.
    pub fn validate(&self, len: usize) -> AppResult<()> {
        if self.start_logits.is_empty() || self.end_logits.is_empty() {
            return Err(AppError::Inference("oracle returned empty scores".to_string()));
        }

        if self.start_logits.len() != len || self.end_logits.len() != len {
            return Err(AppError::Inference(format!(
                "score length mismatch: {} tokens, {} start scores, {} end scores",
                len,
                self.start_logits.len(),
                self.end_logits.len()
            )));
        }

        Ok(())
    }
}

/// Inclusive token positions of a decoded answer.
///
/// `end < start` is possible; such a span decodes to the start token alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Result of reading one excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Mean of the best start score and the best end score
    pub score: f32,

    /// Reconstructed answer text
    pub answer: String,

    /// Selected token positions
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEP: u32 = 102;

    #[test]
    fn test_model_size_table() {
        let expected = [
            ("small", "mrm8488/bert-tiny-finetuned-squadv2"),
            ("medium", "mrm8488/bert-medium-finetuned-squadv2"),
            (
                "large",
                "bert-large-uncased-whole-word-masking-finetuned-squad",
            ),
        ];

        assert_eq!(ModelSize::ALL.len(), expected.len());
        for (size, (nickname, identifier)) in ModelSize::ALL.iter().zip(expected) {
            assert_eq!(size.as_str(), nickname);
            assert_eq!(size.identifier(), identifier);
            assert_eq!(ModelSize::parse(nickname), Some(*size));
            assert_eq!(resolve_model_name(nickname), identifier);
        }
    }

    #[test]
    fn test_model_size_parsing() {
        assert_eq!(ModelSize::parse("LARGE"), Some(ModelSize::Large));
        assert_eq!(ModelSize::parse(" small "), Some(ModelSize::Small));
        assert_eq!(ModelSize::parse("huge"), None);
        assert_eq!(ModelSize::default(), ModelSize::Medium);
    }

    #[test]
    fn test_resolve_passes_through_full_names() {
        assert_eq!(
            resolve_model_name("deepset/bert-base-cased-squad2"),
            "deepset/bert-base-cased-squad2"
        );
    }

    #[test]
    fn test_build_segments() {
        // [CLS] q q [SEP] p p [SEP]
        let input = ModelInput::build(vec![101, 7, 8, SEP, 9, 10, SEP], SEP, 512).unwrap();
        assert_eq!(input.segment_ids, vec![0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(input.segment_ids.len(), input.input_ids.len());
        assert_eq!(input.passage_start(), Some(4));
    }

    #[test]
    fn test_build_truncates_passage_only() {
        let mut ids = vec![101, 7, 8, SEP];
        ids.extend(1000..2000);
        ids.push(SEP);

        let input = ModelInput::build(ids, SEP, 512).unwrap();
        assert_eq!(input.len(), 512);
        assert_eq!(input.segment_ids.len(), 512);
        assert_eq!(&input.input_ids[..4], &[101, 7, 8, SEP]);
        assert_eq!(input.segment_ids.iter().filter(|&&s| s == 0).count(), 4);
    }

    #[test]
    fn test_build_separator_at_budget_edge() {
        // Separator is the last token that fits
        let input = ModelInput::build(vec![101, 7, SEP, 9, SEP], SEP, 3).unwrap();
        assert_eq!(input.input_ids, vec![101, 7, SEP]);
        assert_eq!(input.passage_start(), None);
    }

    #[test]
    fn test_build_without_separator() {
        let result = ModelInput::build(vec![101, 7, 8], SEP, 512);
        assert!(matches!(result, Err(AppError::MalformedInput(_))));
    }

    #[test]
    fn test_build_question_over_budget() {
        let mut ids: Vec<u32> = (1000..1010).collect();
        ids.push(SEP);
        let result = ModelInput::build(ids, SEP, 8);
        assert!(matches!(result, Err(AppError::MalformedInput(_))));
    }

    #[test]
    fn test_validate_scores() {
        let scores = SpanScores {
            start_logits: vec![0.1, 0.2],
            end_logits: vec![0.3, 0.4],
        };
        assert!(scores.validate(2).is_ok());
        assert!(matches!(scores.validate(3), Err(AppError::Inference(_))));

        let empty = SpanScores {
            start_logits: vec![],
            end_logits: vec![],
        };
        assert!(matches!(empty.validate(0), Err(AppError::Inference(_))));
    }
}
