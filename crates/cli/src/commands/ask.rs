//! Ask command handler.
//!
//! Answers one question against the configured index and oracle.

use clap::Args;
use serde_json::{json, Value};
use xqa_answer::{normalize_question, AnswerOptions, CandidateAnswer, ExtractiveQa, QaResponse};
use xqa_core::{config::AppConfig, AppError, AppResult};

/// Reply given when no question text was supplied.
const EMPTY_QUESTION_MESSAGE: &str = "I have a question: What is your question?";

/// Answer a question from the indexed articles
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: Option<String>,

    /// Number of articles to retrieve
    #[arg(short)]
    pub n: Option<usize>,

    /// Highlight fragment size in characters
    #[arg(long)]
    pub fragment_size: Option<usize>,

    /// Print every ranked candidate instead of only the best one
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question.as_deref().map(str::trim).unwrap_or_default();
        if question.is_empty() {
            if self.json {
                print_json(&json!({ "status": 400, "message": EMPTY_QUESTION_MESSAGE }))?;
            } else {
                println!("{}", EMPTY_QUESTION_MESSAGE);
            }
            return Ok(());
        }

        let options = self.options(config)?;
        let qa = ExtractiveQa::connect(config).await?;

        let result = if self.all {
            self.print_all(&qa, question, &options).await
        } else {
            let response = qa.answer(question, &options).await?;
            self.print_response(&response)
        };

        qa.close();
        result
    }

    /// Request options: config defaults, then command-line flags.
    ///
    /// Flags obey the same lower bounds as the config values they override.
    fn options(&self, config: &AppConfig) -> AppResult<AnswerOptions> {
        let mut options = AnswerOptions::from(&config.answer);
        if let Some(n) = self.n {
            if n == 0 {
                return Err(AppError::Config("-n must be at least 1".to_string()));
            }
            options = options.with_n(n);
        }
        if let Some(fragment_size) = self.fragment_size {
            if fragment_size == 0 {
                return Err(AppError::Config(
                    "--fragment-size must be at least 1".to_string(),
                ));
            }
            options = options.with_fragment_size(fragment_size);
        }
        Ok(options)
    }

    fn print_response(&self, response: &QaResponse) -> AppResult<()> {
        if self.json {
            return print_json(&response_json(response));
        }

        match &response.answer {
            Some(best) => {
                println!("{}", best.answer);
                tracing::debug!("{} (article {}: {})", best, best.article_id, best.article_title);
            }
            None => println!("No answer found."),
        }
        Ok(())
    }

    async fn print_all(
        &self,
        qa: &ExtractiveQa,
        question: &str,
        options: &AnswerOptions,
    ) -> AppResult<()> {
        let ranked = qa
            .possible_answers(&normalize_question(question), options)
            .await?;

        if self.json {
            let candidates: Vec<Value> = ranked.iter().map(candidate_json).collect();
            return print_json(&Value::Array(candidates));
        }

        if ranked.is_empty() {
            println!("No answer found.");
        }
        for candidate in &ranked {
            println!("{}  [{}]", candidate, candidate.article_title);
        }
        Ok(())
    }
}

/// JSON shape of a served answer: `{req_no, status, message}`.
fn response_json(response: &QaResponse) -> Value {
    json!({
        "req_no": response.request_id,
        "status": 200,
        "message": response.answer.as_ref().map(candidate_json),
    })
}

fn candidate_json(candidate: &CandidateAnswer) -> Value {
    json!({
        "answer": candidate.answer,
        "score": candidate.score,
        "articleId": candidate.article_id,
        "articleTitle": candidate.article_title,
        "excerpt": candidate.excerpt,
    })
}

fn print_json(value: &Value) -> AppResult<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
