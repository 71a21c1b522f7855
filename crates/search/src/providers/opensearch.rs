//! OpenSearch retrieval provider.
//!
//! Talks to an OpenSearch (or Elasticsearch) cluster over its REST API.
//! Query DSL: https://opensearch.org/docs/latest/query-dsl/full-text/multi-match/

use crate::client::{ArticleHit, SearchClient, SearchRequest};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};
use xqa_core::config::SearchConfig;
use xqa_core::{AppError, AppResult, HighlightTags};

/// Document field holding the article body.
const TEXT_FIELD: &str = "text";

/// Document field holding the article title.
const TITLE_FIELD: &str = "title";

/// Multi-valued fields stored as nested objects. Never read at query time.
const NESTED_FIELDS: [&str; 5] = [
    "headings",
    "categories",
    "places",
    "outgoing_links",
    "external_links",
];

/// `_search` response envelope.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: RawSource,
    #[serde(default)]
    highlight: Option<RawHighlight>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct RawHighlight {
    #[serde(default)]
    text: Vec<String>,
}

/// OpenSearch retrieval client.
pub struct OpenSearchClient {
    /// Provider flavour reported by `provider_name`
    provider: String,

    /// Base URL of the cluster, without trailing slash
    base_url: String,

    /// Article index name
    index: String,

    /// Multiplier applied to title matches
    title_boost: f32,

    /// Emphasis markers requested for highlights
    tags: HighlightTags,

    /// Basic-auth credentials
    auth: Option<(String, Option<String>)>,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenSearchClient {
    /// Create a client for `base_url` and `index` with default settings.
    pub fn new(base_url: impl Into<String>, index: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            provider: "opensearch".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.into(),
            title_boost: 2.0,
            tags: HighlightTags::default(),
            auth: None,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the search configuration.
    pub fn from_config(config: &SearchConfig) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for search: {}", e))
        })?;

        let auth = config
            .username
            .as_ref()
            .map(|user| (user.clone(), config.resolve_password()));

        Ok(Self {
            provider: config.provider.to_lowercase(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            title_boost: config.title_boost,
            tags: config.highlight_tags.clone(),
            auth,
            client,
        })
    }

    /// Set the title boost. Values below 1.0 are raised to 1.0.
    pub fn with_title_boost(mut self, title_boost: f32) -> Self {
        self.title_boost = title_boost.max(1.0);
        self
    }

    /// Set basic-auth credentials.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.auth = Some((username.into(), password));
        self
    }

    /// Build the query DSL body for a request.
    fn build_query(&self, request: &SearchRequest) -> Value {
        json!({
            "size": request.limit,
            "query": {
                "multi_match": {
                    "query": request.query,
                    "type": "most_fields",
                    // Title matches weigh more than body matches
                    "fields": [format!("{}^{}", TITLE_FIELD, self.title_boost), TEXT_FIELD]
                }
            },
            "highlight": {
                "fields": { "text": {} },
                "pre_tags": [self.tags.pre],
                "post_tags": [self.tags.post],
                "fragment_size": request.fragment_size
            }
        })
    }

    /// Index mapping declaring the nested multi-valued fields.
    fn index_mapping() -> Value {
        let properties: serde_json::Map<String, Value> = NESTED_FIELDS
            .iter()
            .map(|field| (field.to_string(), json!({ "type": "nested" })))
            .collect();

        json!({ "mappings": { "properties": properties } })
    }

    /// Convert a raw backend hit into an `ArticleHit`.
    fn convert_hit(hit: RawHit) -> AppResult<ArticleHit> {
        let id = hit.id.parse::<u64>().map_err(|_| {
            AppError::Retrieval(format!("Article id is not an integer: {:?}", hit.id))
        })?;

        Ok(ArticleHit {
            score: hit.score.unwrap_or(0.0),
            id,
            title: hit.source.title,
            highlights: hit.highlight.map(|h| h.text).unwrap_or_default(),
        })
    }

    /// Parse a `_search` response body into at most `limit` hits.
    fn parse_hits(body: &str, limit: usize) -> AppResult<Vec<ArticleHit>> {
        let response: SearchResponse = serde_json::from_str(body)
            .map_err(|e| AppError::Retrieval(format!("Failed to parse search response: {}", e)))?;

        response
            .hits
            .hits
            .into_iter()
            .take(limit)
            .map(Self::convert_hit)
            .collect()
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth {
            Some((user, password)) => builder.basic_auth(user, password.as_ref()),
            None => builder,
        }
    }

    /// Send a request, mapping transport failures to `RetrievalUnavailable`.
    async fn send(&self, builder: RequestBuilder) -> AppResult<reqwest::Response> {
        builder.send().await.map_err(|e| {
            AppError::RetrievalUnavailable(format!(
                "Failed to reach {} at {}: {}",
                self.provider, self.base_url, e
            ))
        })
    }

    /// Turn a non-success response into the matching error.
    async fn status_error(&self, response: reqwest::Response) -> AppError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return AppError::IndexNotReady(format!(
                "Index '{}' does not exist on {}",
                self.index, self.base_url
            ));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        AppError::Retrieval(format!(
            "{} API error ({}): {}",
            self.provider, status, error_text
        ))
    }
}

#[async_trait::async_trait]
impl SearchClient for OpenSearchClient {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    #[instrument(skip(self), fields(index = %self.index))]
    async fn connect(&self) -> AppResult<()> {
        let url = self.index_url();
        let response = self.send(self.request(Method::HEAD, &url)).await?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        info!("Connected to {} at {}", self.provider, self.base_url);
        Ok(())
    }

    #[instrument(skip(self, request), fields(index = %self.index, limit = request.limit))]
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<ArticleHit>> {
        debug!("Searching for: {}", request.query);

        let url = format!("{}/_search", self.index_url());
        let body = self.build_query(request);
        let response = self
            .send(self.request(Method::POST, &url).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to read search response: {}", e)))?;
        let hits = Self::parse_hits(&text, request.limit)?;

        debug!(
            "Retrieved {} hits with {} fragments",
            hits.len(),
            hits.iter().map(|h| h.highlights.len()).sum::<usize>()
        );
        Ok(hits)
    }

    #[instrument(skip(self), fields(index = %self.index))]
    async fn ensure_index(&self) -> AppResult<()> {
        let url = self.index_url();
        let response = self
            .send(self.request(Method::PUT, &url).json(&Self::index_mapping()))
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Created index '{}'", self.index);
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST
            && error_text.contains("resource_already_exists_exception")
        {
            debug!("Index '{}' already exists", self.index);
            return Ok(());
        }

        Err(AppError::Retrieval(format!(
            "Failed to create index '{}' ({}): {}",
            self.index, status, error_text
        )))
    }
}
