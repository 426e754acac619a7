//! Turns one [`ArticleRecord`] into a [`ResolvedDocument`].
//!
//! Network trouble never fails a record: an unreachable redirect falls back
//! to the original URL and an unscrapeable page becomes empty text, leaving
//! the API-provided description and content as candidates. Only a record
//! whose URL cannot possibly be fetched is rejected.

use crate::error::ResolveError;
use crate::models::{ArticleRecord, ResolvedDocument};
use crate::normalize::{normalize, normalize_raw};
use crate::scrapers::PageFetcher;
use crate::segment::{main_content, SentenceSegmenter, MAIN_CONTENT_SENTENCES};
use crate::select::select;
use crate::utils::truncate_for_log;
use tracing::{debug, instrument, warn};
use url::Url;

/// Scraped text for one record, before candidate selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedText {
    /// The URL that was actually scraped.
    pub resolved_url: String,
    /// Normalized full text.
    pub raw_text: String,
    /// Normalized main-content candidate.
    pub normalized_text: String,
}

/// Resolves records against a [`PageFetcher`] and a [`SentenceSegmenter`].
pub struct CandidateResolver<F, S> {
    fetcher: F,
    segmenter: S,
    max_sentences: usize,
}

impl<F, S> CandidateResolver<F, S>
where
    F: PageFetcher,
    S: SentenceSegmenter,
{
    pub fn new(fetcher: F, segmenter: S) -> Self {
        Self {
            fetcher,
            segmenter,
            max_sentences: MAIN_CONTENT_SENTENCES,
        }
    }

    pub fn with_max_sentences(mut self, max_sentences: usize) -> Self {
        self.max_sentences = max_sentences;
        self
    }

    /// Redirect resolution, scraping and normalization for one record.
    #[instrument(level = "info", skip_all, fields(url = %record.url))]
    pub async fn scrape(&self, record: &ArticleRecord) -> Result<ScrapedText, ResolveError> {
        validate_url(&record.url)?;

        let resolved_url = match self.fetcher.resolve_url(&record.url).await {
            Ok(final_url) => final_url,
            Err(e) => {
                warn!(stage = "redirect", error = %e, "Redirect resolution failed; using original URL");
                record.url.clone()
            }
        };

        let fetched = match self.fetcher.fetch_text(&resolved_url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(stage = "scrape", %resolved_url, error = %e, "Error fetching content; continuing with empty text");
                String::new()
            }
        };

        let lede = main_content(&self.segmenter, &fetched, self.max_sentences);
        let scraped = ScrapedText {
            resolved_url,
            raw_text: normalize_raw(&fetched),
            normalized_text: normalize(&lede),
        };
        debug!(
            raw_bytes = scraped.raw_text.len(),
            lede = %truncate_for_log(&scraped.normalized_text, 120),
            "Scraped record"
        );
        Ok(scraped)
    }

    /// Full resolution: [`Self::scrape`] followed by candidate selection.
    pub async fn resolve(&self, record: &ArticleRecord) -> Result<ResolvedDocument, ResolveError> {
        let scraped = self.scrape(record).await?;
        let final_text = select(
            &scraped.normalized_text,
            &record.description,
            &record.api_content,
        );
        Ok(ResolvedDocument {
            source_url: record.url.clone(),
            raw_text: scraped.raw_text,
            normalized_text: scraped.normalized_text,
            final_text,
        })
    }
}

/// Reject records whose URL is not an absolute http(s) URL.
fn validate_url(raw: &str) -> Result<(), ResolveError> {
    if raw.trim().is_empty() {
        return Err(ResolveError::MalformedRecord("empty URL".to_string()));
    }
    let parsed = Url::parse(raw)
        .map_err(|e| ResolveError::MalformedRecord(format!("invalid URL {raw:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ResolveError::MalformedRecord(format!(
            "unsupported URL scheme {other:?} in {raw:?}"
        ))),
    }
}
