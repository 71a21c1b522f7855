//! Candidate extraction: one excerpt in, one scored answer out.

use crate::oracle::SpanOracle;
use crate::tokenizer::PairTokenizer;
use crate::types::{Extraction, ModelInput, Span, SpanScores, MAX_TOKENS};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use xqa_core::{AppError, AppResult, HighlightTags};

/// Trait for anything that can answer a question from a single excerpt.
#[async_trait::async_trait]
pub trait ExcerptReader: Send + Sync {
    /// Read `excerpt` and return the best answer it contains.
    async fn read(&self, excerpt: &str, question: &str) -> AppResult<Extraction>;

    /// Answer text meaning "nothing found in this excerpt".
    fn no_answer_text(&self) -> &str;
}

/// Extracts answer spans with a tokenizer and a span oracle.
pub struct CandidateExtractor {
    tokenizer: Arc<dyn PairTokenizer>,
    oracle: Arc<dyn SpanOracle>,

    /// Single-access guard around the oracle, when it is not reentrant
    oracle_guard: Option<Mutex<()>>,

    tags: HighlightTags,
    max_tokens: usize,
}

impl CandidateExtractor {
    /// Create an extractor with the default token budget and a serialized oracle.
    pub fn new(tokenizer: Arc<dyn PairTokenizer>, oracle: Arc<dyn SpanOracle>) -> Self {
        Self {
            tokenizer,
            oracle,
            oracle_guard: Some(Mutex::new(())),
            tags: HighlightTags::default(),
            max_tokens: MAX_TOKENS,
        }
    }

    /// Set the maximum number of tokens per model input.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Choose whether oracle calls queue behind a single-access guard.
    pub fn with_serialized_oracle(mut self, serialized: bool) -> Self {
        self.oracle_guard = serialized.then(|| Mutex::new(()));
        self
    }

    /// Set the highlight markers stripped from excerpts.
    pub fn with_tags(mut self, tags: HighlightTags) -> Self {
        self.tags = tags;
        self
    }

    /// Name of the underlying oracle.
    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Tokenize the pair and assemble the truncated model input.
    fn prepare(&self, excerpt: &str, question: &str) -> AppResult<ModelInput> {
        // The oracle must only ever see natural-language text
        let passage = self.tags.strip(excerpt);
        let ids = self.tokenizer.encode_pair(question, &passage)?;
        ModelInput::build(ids, self.tokenizer.special_tokens().sep_id, self.max_tokens)
    }

    /// Ask the oracle, queueing behind the guard when one is configured.
    async fn score(&self, input: &ModelInput) -> AppResult<SpanScores> {
        match &self.oracle_guard {
            Some(guard) => {
                let _permit = guard.lock().await;
                self.oracle.score(input).await
            }
            None => self.oracle.score(input).await,
        }
    }

    /// Extract the best answer to `question` from `excerpt`.
    #[instrument(skip_all, fields(oracle = self.oracle.name()))]
    pub async fn extract(&self, excerpt: &str, question: &str) -> AppResult<Extraction> {
        let input = self.prepare(excerpt, question)?;
        let scores = self.score(&input).await?;
        scores.validate(input.len())?;

        let (start, start_max) = argmax(&scores.start_logits)
            .ok_or_else(|| AppError::Inference("start scores are all NaN".to_string()))?;
        let (end, end_max) = argmax(&scores.end_logits)
            .ok_or_else(|| AppError::Inference("end scores are all NaN".to_string()))?;

        // Mean of the two peaks
        let score = (start_max + end_max) / 2.0;

        let span = Span { start, end };
        let answer = self.decode(&input, span)?;

        debug!(
            "Span [{}, {}] score={:.3} answer='{}'",
            span.start, span.end, score, answer
        );

        Ok(Extraction {
            score,
            answer,
            span,
        })
    }

    /// Turn the tokens of `span` back into text.
    fn decode(&self, input: &ModelInput, span: Span) -> AppResult<String> {
        let last = span.end.max(span.start);
        let tokens = input.input_ids[span.start..=last]
            .iter()
            .map(|&id| {
                self.tokenizer.id_to_token(id).ok_or_else(|| {
                    AppError::Tokenizer(format!("Token id {} is not in the vocabulary", id))
                })
            })
            .collect::<AppResult<Vec<String>>>()?;

        Ok(merge_wordpieces(
            &tokens,
            span.end.saturating_sub(span.start),
            &self.tokenizer.special_tokens().continuation_prefix,
        ))
    }
}

#[async_trait::async_trait]
impl ExcerptReader for CandidateExtractor {
    async fn read(&self, excerpt: &str, question: &str) -> AppResult<Extraction> {
        self.extract(excerpt, question).await
    }

    fn no_answer_text(&self) -> &str {
        &self.tokenizer.special_tokens().no_answer
    }
}

/// Position and value of the highest score; the first one wins ties.
///
/// NaN entries are skipped. Returns `None` when nothing comparable remains.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

/// Join `tokens[0..=last]` into text.
///
/// The first token is kept verbatim. Every later token is appended after a
/// space, unless it starts with `prefix`, in which case the prefix is dropped
/// and the piece glued onto the previous word.
pub fn merge_wordpieces(tokens: &[String], last: usize, prefix: &str) -> String {
    let Some(first) = tokens.first() else {
        return String::new();
    };

    let mut answer = first.clone();
    for token in tokens.iter().take(last + 1).skip(1) {
        match token.strip_prefix(prefix) {
            Some(piece) => answer.push_str(piece),
            None => {
                answer.push(' ');
                answer.push_str(token);
            }
        }
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockOracle;
    use crate::tokenizer::MockTokenizer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const QUESTION: &str = "How many tomatoes did Philip eat?";
    const EXCERPT: &str = "Philip loves tomatoes- he ate 5 and Samantha ate 7.";

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_argmax_first_occurrence_wins() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some((1, 3.0)));
        assert_eq!(argmax(&[-4.0, -1.0, -2.0]), Some((1, -1.0)));
        assert_eq!(argmax(&[f32::NAN, 0.5, f32::NAN]), Some((1, 0.5)));
        assert_eq!(argmax(&[f32::NAN]), None);
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_merge_single_token_has_no_leading_space() {
        assert_eq!(merge_wordpieces(&strings(&["1870"]), 0, "##"), "1870");
    }

    #[test]
    fn test_merge_words_and_pieces() {
        let tokens = strings(&["the", "colorado", "school", "of", "mi", "##nes"]);
        assert_eq!(
            merge_wordpieces(&tokens, 5, "##"),
            "the colorado school of mines"
        );
    }

    #[test]
    fn test_merge_leading_piece_kept_verbatim() {
        let tokens = strings(&["##ing", "##s", "end"]);
        assert_eq!(merge_wordpieces(&tokens, 2, "##"), "##ings end");
    }

    #[test]
    fn test_merge_stops_at_last() {
        let tokens = strings(&["a", "b", "c"]);
        assert_eq!(merge_wordpieces(&tokens, 1, "##"), "a b");
    }

    #[tokio::test]
    async fn test_extract_tomatoes() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let five = tokenizer.id_for("5");
        let oracle = Arc::new(MockOracle::targeting(five, 6.0));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        let extraction = extractor.extract(EXCERPT, QUESTION).await.unwrap();
        assert_eq!(extraction.answer, "5");
        assert_eq!(extraction.score, 6.0);
        assert_eq!(extraction.span.start, extraction.span.end);
    }

    #[tokio::test]
    async fn test_extract_strips_highlight_markers() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_by_oracle = seen.clone();
        let oracle_tokenizer = tokenizer.clone();
        let oracle = Arc::new(MockOracle::new(move |input: &ModelInput| {
            let tokens: Vec<String> = input
                .input_ids
                .iter()
                .filter_map(|&id| oracle_tokenizer.id_to_token(id))
                .collect();
            seen_by_oracle.lock().unwrap().extend(tokens);
            SpanScores {
                start_logits: vec![0.0; input.len()],
                end_logits: vec![0.0; input.len()],
            }
        }));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        extractor
            .extract("<em>Philip</em> ate <em>5</em>", QUESTION)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.iter().all(|t| t != "em" && t != "<" && t != "/"));
        assert!(seen.contains(&"philip".to_string()));
    }

    #[tokio::test]
    async fn test_extract_strips_custom_markers() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let expected = tokenizer.encode_pair(QUESTION, "Philip ate 5").unwrap();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_by_oracle = seen.clone();
        let oracle = Arc::new(MockOracle::new(move |input: &ModelInput| {
            *seen_by_oracle.lock().unwrap() = input.input_ids.clone();
            SpanScores {
                start_logits: vec![0.0; input.len()],
                end_logits: vec![0.0; input.len()],
            }
        }));
        let extractor = CandidateExtractor::new(tokenizer, oracle).with_tags(HighlightTags {
            pre: "<mark>".to_string(),
            post: "</mark>".to_string(),
        });

        extractor
            .extract("<mark>Philip</mark> ate <mark>5</mark>", QUESTION)
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_extract_merges_subwords() {
        let tokenizer =
            Arc::new(MockTokenizer::new().with_pieces("Samantha", &["sam", "##anth", "##a"]));
        let ids = tokenizer.encode_pair(QUESTION, EXCERPT).unwrap();
        let start = ids
            .iter()
            .position(|&id| id == tokenizer.id_for("sam"))
            .unwrap();
        let oracle = Arc::new(MockOracle::pointing_at(start, start + 2, 2.0));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        let extraction = extractor.extract(EXCERPT, QUESTION).await.unwrap();
        assert_eq!(extraction.answer, "samantha");
    }

    #[tokio::test]
    async fn test_extract_multi_word_span() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let ids = tokenizer.encode_pair(QUESTION, EXCERPT).unwrap();
        let sep = ids
            .iter()
            .position(|&id| id == tokenizer.special_tokens().sep_id)
            .unwrap();
        let ate = sep
            + 1
            + ids[sep + 1..]
                .iter()
                .position(|&id| id == tokenizer.id_for("ate"))
                .unwrap();
        let oracle = Arc::new(MockOracle::pointing_at(ate, ate + 1, 1.0));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        let extraction = extractor.extract(EXCERPT, QUESTION).await.unwrap();
        assert_eq!(extraction.answer, "ate 5");
    }

    #[tokio::test]
    async fn test_extract_end_before_start_yields_start_token() {
        let tokenizer = Arc::new(MockTokenizer::new());
        // [CLS] how many tomatoes did philip eat ? [SEP] philip loves ...
        let oracle = Arc::new(MockOracle::pointing_at(10, 4, 1.0));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        let extraction = extractor.extract(EXCERPT, QUESTION).await.unwrap();
        assert_eq!(extraction.span, Span { start: 10, end: 4 });
        assert_eq!(extraction.answer, "loves");
    }

    #[tokio::test]
    async fn test_extract_no_answer_sentinel() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let absent = tokenizer.id_for("zucchini");
        let oracle = Arc::new(MockOracle::targeting(absent, -1.0));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        let extraction = extractor.extract(EXCERPT, QUESTION).await.unwrap();
        assert_eq!(extraction.answer, extractor.no_answer_text());
        assert_eq!(extraction.answer, "[CLS]");
    }

    #[tokio::test]
    async fn test_extract_score_is_arithmetic_mean() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let oracle = Arc::new(MockOracle::new(|input: &ModelInput| {
            let mut start = vec![-9.0; input.len()];
            let mut end = vec![-9.0; input.len()];
            start[9] = 4.0;
            end[9] = -2.0;
            SpanScores {
                start_logits: start,
                end_logits: end,
            }
        }));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        let extraction = extractor.extract(EXCERPT, QUESTION).await.unwrap();
        assert_eq!(extraction.score, 1.0);
    }

    #[tokio::test]
    async fn test_long_excerpt_is_truncated_not_rejected() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let oracle = Arc::new(MockOracle::new(|input: &ModelInput| {
            assert!(input.len() <= 64);
            assert_eq!(input.segment_ids.len(), input.input_ids.len());
            SpanScores {
                start_logits: vec![0.0; input.len()],
                end_logits: vec![0.0; input.len()],
            }
        }));
        let extractor = CandidateExtractor::new(tokenizer, oracle.clone()).with_max_tokens(64);

        let long_excerpt = "tomato ".repeat(1_000);
        let result = extractor.extract(&long_excerpt, QUESTION).await;
        assert!(result.is_ok());
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_question_over_budget_is_malformed() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let oracle = Arc::new(MockOracle::pointing_at(0, 0, 0.0));
        let extractor = CandidateExtractor::new(tokenizer, oracle.clone()).with_max_tokens(4);

        let result = extractor.extract(EXCERPT, QUESTION).await;
        assert!(matches!(result, Err(AppError::MalformedInput(_))));
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_misaligned_scores_rejected() {
        let tokenizer = Arc::new(MockTokenizer::new());
        let oracle = Arc::new(MockOracle::new(|_: &ModelInput| SpanScores {
            start_logits: vec![1.0, 2.0],
            end_logits: vec![1.0, 2.0],
        }));
        let extractor = CandidateExtractor::new(tokenizer, oracle);

        let result = extractor.extract(EXCERPT, QUESTION).await;
        assert!(matches!(result, Err(AppError::Inference(_))));
    }

    /// Oracle that sleeps and records how many calls overlap.
    struct SlowOracle {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SpanOracle for SlowOracle {
        fn name(&self) -> &str {
            "slow"
        }

        async fn score(&self, input: &ModelInput) -> AppResult<SpanScores> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(SpanScores {
                start_logits: vec![0.0; input.len()],
                end_logits: vec![0.0; input.len()],
            })
        }
    }

    async fn max_overlap(serialized: bool) -> usize {
        let oracle = Arc::new(SlowOracle {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let extractor = CandidateExtractor::new(Arc::new(MockTokenizer::new()), oracle.clone())
            .with_serialized_oracle(serialized);

        let reads = (0..6).map(|_| extractor.extract(EXCERPT, QUESTION));
        for result in futures::future::join_all(reads).await {
            assert!(result.is_ok());
        }
        oracle.max_in_flight.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_serialized_oracle_never_overlaps() {
        assert_eq!(max_overlap(true).await, 1);
    }

    #[tokio::test]
    async fn test_unserialized_oracle_may_overlap() {
        assert!(max_overlap(false).await > 1);
    }
}
