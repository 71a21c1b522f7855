//! HTTP span oracle.
//!
//! Sends model inputs to an inference server hosting a span-extraction
//! model and reads back start/end logits.
//!
//! Request:  `{"model": "...", "input_ids": [...], "token_type_ids": [...]}`
//! Response: `{"start_logits": [...], "end_logits": [...]}`

use crate::oracle::SpanOracle;
use crate::types::{resolve_model_name, ModelInput, SpanScores};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use xqa_core::config::ReaderConfig;
use xqa_core::{AppError, AppResult};

/// Inference request payload.
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    input_ids: &'a [u32],
    token_type_ids: &'a [u8],
}

/// Inference response payload.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    start_logits: Vec<f32>,
    end_logits: Vec<f32>,
}

/// Oracle backed by a remote inference endpoint.
pub struct HttpOracle {
    /// URL accepting predict requests
    endpoint: String,

    /// Full model identifier sent with each request
    model: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpOracle {
    /// Create an oracle for `endpoint` serving `model` (nickname or identifier).
    pub fn new(endpoint: impl Into<String>, model: &str) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: resolve_model_name(model),
            client: reqwest::Client::new(),
        }
    }

    /// Create an oracle from the reader configuration.
    pub fn from_config(config: &ReaderConfig) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for oracle: {}", e))
        })?;

        Ok(Self {
            endpoint: config.oracle_endpoint.clone(),
            model: resolve_model_name(&config.model),
            client,
        })
    }

    /// Model identifier this oracle requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_request<'a>(&'a self, input: &'a ModelInput) -> PredictRequest<'a> {
        PredictRequest {
            model: &self.model,
            input_ids: &input.input_ids,
            token_type_ids: &input.segment_ids,
        }
    }
}

#[async_trait::async_trait]
impl SpanOracle for HttpOracle {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, input), fields(model = %self.model, tokens = input.len()))]
    async fn score(&self, input: &ModelInput) -> AppResult<SpanScores> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.to_request(input))
            .send()
            .await
            .map_err(|e| {
                AppError::OracleUnavailable(format!(
                    "Failed to reach oracle at {}: {}",
                    self.endpoint, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("Oracle error ({}): {}", status, error_text);

            // Gateway and overload statuses mean the model is not serving
            return Err(match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => AppError::OracleUnavailable(message),
                _ => AppError::Inference(message),
            });
        }

        let predicted: PredictResponse = response
            .json()
            .await
            .map_err(|e| AppError::Inference(format!("Failed to parse oracle response: {}", e)))?;

        debug!("Oracle returned {} positions", predicted.start_logits.len());

        Ok(SpanScores {
            start_logits: predicted.start_logits,
            end_logits: predicted.end_logits,
        })
    }
}
