//! Error types for each stage of the pipeline.
//!
//! Recoverable stage errors ([`FetchError`]) are absorbed where they occur and
//! only ever show up in logs. [`ResolveError`] and [`SummarizeError`] are
//! per-document: the batch keeps going. [`SourceError`] and [`ConfigError`]
//! abort the run before any document is processed.

use thiserror::Error;

/// Failures talking to the live web, either while following redirects or
/// while scraping an article body.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("unsupported content type {content_type:?} for {url}")]
    UnsupportedContent { url: String, content_type: String },

    #[error("could not parse article: {0}")]
    Parse(String),
}

/// Errors that abort the resolution of a single record.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// Errors raised by a [`crate::summarizer::Seq2SeqModel`] backend.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("model backend error: {0}")]
    Backend(String),
}

impl ModelError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Request(e) => e.is_timeout() || e.is_connect(),
            ModelError::Server { status, .. } => *status == 429 || *status >= 500,
            ModelError::Backend(_) => false,
        }
    }
}

/// Errors that skip summarization for a single document.
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("input is {tokens} tokens, model accepts at most {limit}")]
    InputTooLong { tokens: usize, limit: usize },

    #[error("model produced an empty summary")]
    EmptyGeneration,

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors while loading the batch of article records.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("missing API key: set NEWS_API_KEY or pass --news-api-key")]
    MissingApiKey,

    #[error("could not read CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not list input directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors while loading the YAML configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
