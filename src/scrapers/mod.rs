//! Fetching article text from the live web.
//!
//! Resolution works against the [`PageFetcher`] trait so the pipeline can be
//! driven by the real [`web::WebScraper`] or by a canned fetcher in tests.
//! Fetching is two-phase:
//!
//! 1. **Redirect resolution**: follow the search result link (often a
//!    tracking or aggregator URL) to the publisher's canonical URL
//! 2. **Fetching**: download the page and extract the article body as text
//!
//! Callers decide how to recover from a [`FetchError`]; the resolver treats
//! every fetch failure as recoverable.

use crate::error::FetchError;

pub mod web;

/// Source of article pages.
pub trait PageFetcher {
    /// Follow redirects for `url` and return the effective URL.
    async fn resolve_url(&self, url: &str) -> Result<String, FetchError>;

    /// Download `url` and return the extracted article text.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
