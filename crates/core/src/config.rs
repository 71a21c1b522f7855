//! Configuration management for XQA.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - A YAML config file (`XQA_CONFIG` or `./xqa.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::highlight::HighlightTags;

/// Config file looked up in the working directory when `XQA_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "xqa.yaml";

/// Search backends speaking the same `_search` wire format.
pub const KNOWN_SEARCH_PROVIDERS: [&str; 2] = ["opensearch", "elasticsearch"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file the values were read from, if any
    pub config_file: Option<PathBuf>,

    /// Retrieval backend settings
    pub search: SearchConfig,

    /// Tokenizer and span-extraction oracle settings
    pub reader: ReaderConfig,

    /// Per-request defaults
    pub answer: AnswerDefaults,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Search backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Backend flavour ("opensearch" or "elasticsearch")
    pub provider: String,

    /// Base URL of the cluster
    pub endpoint: String,

    /// Collection holding the articles
    pub index: String,

    /// Basic-auth user, if the cluster requires one
    pub username: Option<String>,

    /// Environment variable holding the basic-auth password
    pub password_env: Option<String>,

    /// Weight of title matches relative to body matches
    pub title_boost: f32,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// Markers the backend wraps around matched terms
    pub highlight_tags: HighlightTags,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "opensearch".to_string(),
            endpoint: "http://localhost:9200".to_string(),
            index: "articles".to_string(),
            username: None,
            password_env: None,
            title_boost: 2.0,
            timeout: Some(30),
            highlight_tags: HighlightTags::default(),
        }
    }
}

impl SearchConfig {
    /// Resolve the basic-auth password from its environment variable.
    pub fn resolve_password(&self) -> Option<String> {
        self.password_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }
}

/// Reader (tokenizer + oracle) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Model nickname ("small", "medium", "large") or full identifier
    pub model: String,

    /// Path to the `tokenizer.json` matching the model
    pub tokenizer_path: Option<PathBuf>,

    /// URL accepting span-extraction requests
    pub oracle_endpoint: String,

    /// Maximum number of tokens fed to the model per excerpt
    pub max_tokens: usize,

    /// Funnel oracle calls through a single-access guard
    pub serialize_oracle: bool,

    /// Request timeout in seconds
    pub timeout: Option<u64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            model: "medium".to_string(),
            tokenizer_path: None,
            oracle_endpoint: "http://localhost:8080/predict".to_string(),
            max_tokens: 512,
            serialize_oracle: true,
            timeout: Some(60),
        }
    }
}

/// Defaults applied to every answer request unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerDefaults {
    /// Number of articles to retrieve
    pub n: usize,

    /// Highlight fragment size in characters.
    /// Shorter excerpts tend to give crisper answers and faster inference.
    pub fragment_size: usize,
}

impl Default for AnswerDefaults {
    fn default() -> Self {
        Self {
            n: 4,
            fragment_size: 250,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    search: Option<SearchConfig>,
    reader: Option<ReaderConfig>,
    answer: Option<AnswerDefaults>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            search: SearchConfig::default(),
            reader: ReaderConfig::default(),
            answer: AnswerDefaults::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `XQA_CONFIG`: Path to config file
    /// - `XQA_SEARCH_URL`: Search cluster URL
    /// - `XQA_INDEX`: Article index name
    /// - `XQA_MODEL`: Model nickname or identifier
    /// - `XQA_TOKENIZER`: Path to tokenizer.json
    /// - `XQA_ORACLE_URL`: Span-extraction endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use xqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {}", config.search.index);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `env` to look up environment variables.
    pub fn load_with<F>(env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let config_path = match env("XQA_CONFIG") {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Some(path)
            }
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };

        if let Some(path) = config_path {
            config = config.merge_yaml(&path)?;
        }

        // Environment variables override YAML config
        if let Some(url) = env("XQA_SEARCH_URL") {
            config.search.endpoint = url;
        }

        if let Some(index) = env("XQA_INDEX") {
            config.search.index = index;
        }

        if let Some(model) = env("XQA_MODEL") {
            config.reader.model = model;
        }

        if let Some(tokenizer) = env("XQA_TOKENIZER") {
            config.reader.tokenizer_path = Some(PathBuf::from(tokenizer));
        }

        if let Some(url) = env("XQA_ORACLE_URL") {
            config.reader.oracle_endpoint = url;
        }

        if let Some(level) = env("RUST_LOG") {
            config.log_level = Some(level);
        }

        if env("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(search) = config_file.search {
            result.search = search;
        }

        if let Some(reader) = config_file.reader {
            result.reader = reader;
        }

        if let Some(answer) = config_file.answer {
            result.answer = answer;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the file and the environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        search_url: Option<String>,
        index: Option<String>,
        model: Option<String>,
        oracle_url: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(url) = search_url {
            self.search.endpoint = url;
        }

        if let Some(index) = index {
            self.search.index = index;
        }

        if let Some(model) = model {
            self.reader.model = model;
        }

        if let Some(url) = oracle_url {
            self.reader.oracle_endpoint = url;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate the resolved configuration.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.search.provider.to_lowercase();
        if !KNOWN_SEARCH_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown search provider: {}. Supported: {}",
                self.search.provider,
                KNOWN_SEARCH_PROVIDERS.join(", ")
            )));
        }

        // Title matches must never weigh less than body matches
        if self.search.title_boost.is_nan() || self.search.title_boost < 1.0 {
            return Err(AppError::Config(format!(
                "titleBoost must be at least 1.0, got {}",
                self.search.title_boost
            )));
        }

        let tags = &self.search.highlight_tags;
        if tags.pre.is_empty() || tags.post.is_empty() {
            return Err(AppError::Config(
                "highlightTags needs a non-empty pre and post tag".to_string(),
            ));
        }

        if self.search.username.is_some() && self.search.resolve_password().is_none() {
            return Err(AppError::Config(match &self.search.password_env {
                Some(var) => format!("Search password not found in environment variable: {}", var),
                None => "Search username set without passwordEnv".to_string(),
            }));
        }

        if self.answer.n == 0 {
            return Err(AppError::Config("n must be at least 1".to_string()));
        }

        if self.answer.fragment_size == 0 {
            return Err(AppError::Config(
                "fragmentSize must be at least 1".to_string(),
            ));
        }

        // Room for the start marker, one question token and a separator
        if self.reader.max_tokens < 3 {
            return Err(AppError::Config(format!(
                "maxTokens must be at least 3, got {}",
                self.reader.max_tokens
            )));
        }

        Ok(())
    }
}
