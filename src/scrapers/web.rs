//! Generic HTML article scraper.
//!
//! Works on any publisher page: the body is located with a short list of
//! selectors, from the most specific (`<article>` paragraphs) down to every
//! `<p>` on the page. Paragraphs are returned separated by blank lines so the
//! sentence segmenter sees paragraph boundaries.

use super::PageFetcher;
use crate::config::HttpConfig;
use crate::error::FetchError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Paragraph selectors tried in order; the first one that yields text wins.
const BODY_SELECTORS: [&str; 4] = ["article p", "[itemprop=\"articleBody\"] p", "main p", "p"];

/// [`PageFetcher`] backed by a shared `reqwest` client.
///
/// The client carries the request timeout, so a hung server costs at most
/// one timeout per call and never stalls the rest of the batch.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    /// Build a scraper from the HTTP settings.
    ///
    /// # Arguments
    ///
    /// * `config` - Request timeout and user agent sent to publishers
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialized.
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = client_builder(config).build()?;
        Ok(Self { client })
    }
}

fn client_builder(config: &HttpConfig) -> ClientBuilder {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
}

impl PageFetcher for WebScraper {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn resolve_url(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let final_url = response.url().to_string();
        if final_url != url {
            debug!(%final_url, "Followed redirect");
        }
        Ok(final_url)
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let body = response.text().await?;
        let text = if content_type.contains("html") {
            let text = extract_article_text(&body);
            if text.is_empty() {
                return Err(FetchError::Parse(format!("no paragraph text in {url}")));
            }
            text
        } else if content_type.starts_with("text/plain") {
            body.trim().to_string()
        } else {
            return Err(FetchError::UnsupportedContent {
                url: url.to_string(),
                content_type,
            });
        };

        info!(bytes = text.len(), "Parsed article");
        Ok(text)
    }
}

/// Extract the article body from an HTML document.
///
/// Returns an empty string when no paragraph text is found.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for css in BODY_SELECTORS {
        let selector = Selector::parse(css).unwrap();
        let paragraphs: Vec<String> = document
            .select(&selector)
            .map(|element| {
                // Text nodes are concatenated as-is: inline tags can sit
                // inside a word (`<b>Tues</b>day`) or before punctuation.
                element
                    .text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|p| !p.is_empty())
            .collect();

        if !paragraphs.is_empty() {
            return paragraphs.join("\n\n");
        }
    }

    String::new()
}
