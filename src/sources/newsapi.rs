//! News search through the NewsAPI `everything` endpoint.
//!
//! Results are mapped to [`ArticleRecord`]s with their text fields cleaned by
//! [`clean_api_text`]. Fields the API leaves out or sets to `null` become empty
//! strings.

use crate::config::SearchConfig;
use crate::error::{ConfigError, SourceError};
use crate::models::ArticleRecord;
use crate::normalize::clean_api_text;
use chrono::{Local, NaiveDate, TimeDelta};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::{debug, info, instrument};

/// Parameters of one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
}

impl SearchQuery {
    /// Build a query, filling missing dates from the configured lookback.
    ///
    /// # Arguments
    ///
    /// * `query` - Search terms
    /// * `from` - First publication date; defaults to `to` minus `lookback_days`
    /// * `to` - Last publication date; defaults to today (local time)
    /// * `config` - Language, sort order, page size and lookback window
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `lookback_days` does not fit in
    /// the calendar.
    pub fn new(
        query: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        config: &SearchConfig,
    ) -> Result<Self, ConfigError> {
        let to = to.unwrap_or_else(|| Local::now().date_naive());
        let from = match from {
            Some(from) => from,
            None => lookback_start(to, config.lookback_days)?,
        };
        Ok(Self {
            query: query.to_string(),
            from,
            to,
            language: config.language.clone(),
            sort_by: config.sort_by.clone(),
            page_size: config.page_size,
        })
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query.clone()),
            ("from", self.from.format("%Y-%m-%d").to_string()),
            ("to", self.to.format("%Y-%m-%d").to_string()),
            ("language", self.language.clone()),
            ("sortBy", self.sort_by.clone()),
            ("pageSize", self.page_size.to_string()),
        ]
    }
}

fn lookback_start(to: NaiveDate, lookback_days: i64) -> Result<NaiveDate, ConfigError> {
    TimeDelta::try_days(lookback_days)
        .and_then(|window| to.checked_sub_signed(window))
        .ok_or_else(|| ConfigError::Invalid {
            field: "search.lookback_days",
            reason: format!("{lookback_days} days before {to} is out of range"),
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    total_results: Option<u64>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl From<NewsApiArticle> for ArticleRecord {
    fn from(article: NewsApiArticle) -> Self {
        let clean = |field: Option<String>| field.as_deref().map(clean_api_text).unwrap_or_default();
        ArticleRecord {
            url: article.url.unwrap_or_default(),
            title: clean(article.title),
            description: clean(article.description),
            api_content: clean(article.content),
        }
    }
}

/// Client for the NewsAPI `everything` endpoint.
///
/// Holds its own `reqwest` client with a 30 second timeout; the key is sent in
/// the `X-Api-Key` header rather than the query string.
pub struct NewsApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl NewsApiClient {
    /// Create a client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - NewsAPI key, usually from `NEWS_API_KEY`
    /// * `config` - Search settings; only the endpoint is read here
    ///
    /// # Errors
    ///
    /// [`SourceError::MissingApiKey`] when the key is absent or blank.
    pub fn new(api_key: Option<String>, config: &SearchConfig) -> Result<Self, SourceError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(SourceError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .user_agent(concat!("newsdigest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    /// Run one search.
    ///
    /// # Returns
    ///
    /// The returned articles as [`ArticleRecord`]s, in API order. An empty
    /// result is not an error.
    ///
    /// # Errors
    ///
    /// [`SourceError::Http`] on transport failures and [`SourceError::Api`]
    /// when the API reports an error or the body is not a search response.
    #[instrument(level = "info", skip_all, fields(query = %query.query, from = %query.from, to = %query.to))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<ArticleRecord>, SourceError> {
        info!("Fetching articles from NewsAPI");
        let body = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .query(&query.params())
            .send()
            .await?
            .text()
            .await?;
        let records = records_from_response(&body)?;
        info!(count = records.len(), "Retrieved articles");
        Ok(records)
    }
}

/// Parse a NewsAPI response body into records.
fn records_from_response(body: &str) -> Result<Vec<ArticleRecord>, SourceError> {
    let response: NewsApiResponse = serde_json::from_str(body).map_err(|e| SourceError::Api {
        code: "invalidResponse".to_string(),
        message: e.to_string(),
    })?;

    if response.status != "ok" {
        return Err(SourceError::Api {
            code: response.code.unwrap_or_else(|| response.status.clone()),
            message: response.message.unwrap_or_default(),
        });
    }

    debug!(total_results = ?response.total_results, returned = response.articles.len(), "Parsed search response");
    Ok(response.articles.into_iter().map(ArticleRecord::from).collect())
}
