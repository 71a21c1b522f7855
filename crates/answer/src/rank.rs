//! Candidate aggregation and ranking.
//!
//! Every excerpt of every hit is read independently. Failed reads are logged
//! and counted but never abort the rest of the fan-out.

use crate::types::{CandidateAnswer, CandidateSet};
use futures::future::join_all;
use std::cmp::Ordering;
use tracing::{debug, error, warn};
use xqa_reader::ExcerptReader;
use xqa_search::ArticleHit;

/// Read every excerpt of every hit and collect the candidates.
///
/// Candidates keep retrieval order: hit by hit, excerpt by excerpt.
pub async fn collect_candidates(
    reader: &dyn ExcerptReader,
    question: &str,
    hits: &[ArticleHit],
) -> CandidateSet {
    let reads = hits.iter().flat_map(move |hit| {
        hit.highlights.iter().map(move |excerpt| async move {
            let result = reader.read(excerpt, question).await;
            (hit, excerpt, result)
        })
    });

    let mut set = CandidateSet::default();
    for (hit, excerpt, result) in join_all(reads).await {
        match result {
            Ok(extraction) => set.candidates.push(CandidateAnswer {
                article_id: hit.id,
                article_title: hit.title.clone(),
                excerpt: excerpt.clone(),
                answer: extraction.answer,
                score: extraction.score,
            }),
            Err(e) if e.is_request_fatal() => {
                // Setup problem surfacing through one excerpt; the others still count
                error!(
                    "Reader misconfigured while reading article {} ({}): {}",
                    hit.id, hit.title, e
                );
                set.failures += 1;
            }
            Err(e) => {
                warn!("Extraction failed for article {} ({}): {}", hit.id, hit.title, e);
                set.failures += 1;
            }
        }
    }

    debug!(
        "Read {} candidates from {} hits ({} failures)",
        set.candidates.len(),
        hits.len(),
        set.failures
    );

    set
}

/// Drop "no answer" candidates and order the rest by score, best first.
///
/// Equal scores keep their relative order.
pub fn filter_and_rank(candidates: Vec<CandidateAnswer>, no_answer: &str) -> Vec<CandidateAnswer> {
    let mut ranked: Vec<CandidateAnswer> = candidates
        .into_iter()
        .filter(|c| c.answer != no_answer)
        .collect();
    ranked.sort_by(|a, b| by_score_descending(a.score, b.score));
    ranked
}

/// Descending order with NaN scores sinking to the end.
fn by_score_descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(answer: &str, score: f32) -> CandidateAnswer {
        CandidateAnswer {
            article_id: 1,
            article_title: "Title".to_string(),
            excerpt: "excerpt".to_string(),
            answer: answer.to_string(),
            score,
        }
    }

    fn answers(ranked: &[CandidateAnswer]) -> Vec<&str> {
        ranked.iter().map(|c| c.answer.as_str()).collect()
    }

    #[test]
    fn test_rank_orders_by_score() {
        let ranked = filter_and_rank(
            vec![
                candidate("b", 1.0),
                candidate("a", 3.0),
                candidate("d", -2.0),
                candidate("c", 2.0),
            ],
            "[CLS]",
        );
        assert_eq!(answers(&ranked), vec!["a", "c", "b", "d"]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_rank_drops_sentinel() {
        let ranked = filter_and_rank(
            vec![
                candidate("[CLS]", 9.0),
                candidate("1870", 4.0),
                candidate("[CLS]", 1.0),
            ],
            "[CLS]",
        );
        assert_eq!(answers(&ranked), vec!["1870"]);
    }

    #[test]
    fn test_rank_keeps_ties() {
        let ranked = filter_and_rank(
            vec![candidate("first", 2.5), candidate("second", 2.5)],
            "[CLS]",
        );
        assert_eq!(answers(&ranked), vec!["first", "second"]);
    }

    #[test]
    fn test_rank_nan_last() {
        let ranked = filter_and_rank(
            vec![candidate("nan", f32::NAN), candidate("low", -8.0)],
            "[CLS]",
        );
        assert_eq!(answers(&ranked), vec!["low", "nan"]);
    }

    #[test]
    fn test_rank_empty() {
        assert!(filter_and_rank(Vec::new(), "[CLS]").is_empty());
    }
}
