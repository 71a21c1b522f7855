//! Retrieve-then-read question answering.

use crate::rank::{collect_candidates, filter_and_rank};
use crate::sequencer::RequestSequencer;
use crate::types::{AnswerOptions, CandidateAnswer, CandidateSet, QaResponse};
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};
use xqa_core::{AppConfig, AppResult};
use xqa_reader::ExcerptReader;
use xqa_search::{ArticleHit, SearchClient};

/// Extractive question answering over a search index.
///
/// Holds its collaborators explicitly; build one with [`ExtractiveQa::new`]
/// or [`ExtractiveQa::connect`], share it across requests, and
/// [`close`](ExtractiveQa::close) it when done.
pub struct ExtractiveQa {
    search: Arc<dyn SearchClient>,
    reader: Arc<dyn ExcerptReader>,
    sequencer: RequestSequencer,
}

impl ExtractiveQa {
    pub fn new(search: Arc<dyn SearchClient>, reader: Arc<dyn ExcerptReader>) -> Self {
        Self {
            search,
            reader,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Build the pipeline from configuration and verify the index is reachable.
    ///
    /// # Errors
    /// * `Config` if the configuration is invalid
    /// * `RetrievalUnavailable` / `IndexNotReady` if the index cannot be used
    /// * `Tokenizer` if the tokenizer cannot be loaded
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let search = xqa_search::create_client(&config.search)?;
        search.connect().await?;
        info!(
            "Connected to {} at {} (index '{}')",
            search.provider_name(),
            config.search.endpoint,
            config.search.index
        );

        let reader = xqa_reader::create_reader(&config.reader, &config.search.highlight_tags)?;

        Ok(Self::new(search, reader))
    }

    /// Retrieve the articles most relevant to `question`.
    pub async fn article_search(
        &self,
        question: &str,
        options: &AnswerOptions,
    ) -> AppResult<Vec<ArticleHit>> {
        let hits = self.search.search(&options.search_request(question)).await?;
        debug!("Retrieved {} articles", hits.len());
        Ok(hits)
    }

    /// Every candidate answer, unfiltered and unranked, with the failure count.
    pub async fn unfiltered_answers(
        &self,
        question: &str,
        options: &AnswerOptions,
    ) -> AppResult<CandidateSet> {
        let hits = self.article_search(question, options).await?;
        Ok(collect_candidates(self.reader.as_ref(), question, &hits).await)
    }

    /// Candidate answers without "no answer" results, best first.
    pub async fn possible_answers(
        &self,
        question: &str,
        options: &AnswerOptions,
    ) -> AppResult<Vec<CandidateAnswer>> {
        let set = self.unfiltered_answers(question, options).await?;
        let total = set.candidates.len();
        let ranked = filter_and_rank(set.candidates, self.reader.no_answer_text());

        info!(
            "{} possible answers ({} without an answer, {} failed)",
            ranked.len(),
            total - ranked.len(),
            set.failures
        );

        Ok(ranked)
    }

    /// The highest-scoring answer, if any survived ranking.
    pub async fn best_answer(
        &self,
        question: &str,
        options: &AnswerOptions,
    ) -> AppResult<Option<CandidateAnswer>> {
        Ok(self
            .possible_answers(question, options)
            .await?
            .into_iter()
            .next())
    }

    /// Answer one top-level request.
    ///
    /// The question is normalized to end with a question mark and the
    /// request gets the next sequence number. Only retrieval failures are
    /// returned as errors; anything else yields a response without an answer.
    pub async fn answer(&self, question: &str, options: &AnswerOptions) -> AppResult<QaResponse> {
        let request_id = self.sequencer.next();
        let question = normalize_question(question);

        self.respond(request_id, &question, options)
            .instrument(info_span!("answer", request_id))
            .await
    }

    async fn respond(
        &self,
        request_id: u64,
        question: &str,
        options: &AnswerOptions,
    ) -> AppResult<QaResponse> {
        info!("Question: {}", question);
        let answer = self.best_answer(question, options).await?;

        match &answer {
            Some(best) => info!("Best answer: {}", best),
            None => info!("No answer found"),
        }

        Ok(QaResponse { request_id, answer })
    }

    /// Number of top-level requests served so far.
    pub fn requests_served(&self) -> u64 {
        self.sequencer.issued()
    }

    /// Release the search and reader handles.
    pub fn close(self) {
        info!("Closing pipeline after {} requests", self.requests_served());
    }
}

/// Trim `question` and make sure it ends with a question mark.
pub fn normalize_question(question: &str) -> String {
    let question = question.trim();
    if question.ends_with('?') {
        question.to_string()
    } else {
        format!("{}?", question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_question() {
        assert_eq!(normalize_question("Who wrote Hamlet"), "Who wrote Hamlet?");
        assert_eq!(normalize_question("Who wrote Hamlet?"), "Who wrote Hamlet?");
        assert_eq!(normalize_question("  Why?  "), "Why?");
    }
}
