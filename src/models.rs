//! Data models flowing through the pipeline.
//!
//! - [`ArticleRecord`]: one search result, as returned by the search API or
//!   read from a CSV file
//! - [`ResolvedDocument`]: the text chosen for an article after scraping and
//!   candidate selection
//! - [`Summary`]: the abstractive summary produced for one document
//! - [`RecordOutcome`] / [`BatchReport`]: per-record and aggregate results of
//!   a pipeline run
//! - [`ContentRow`]: one row of the tabular output
//! - [`RunReport`]: the JSON audit record of a whole run
//!
//! The CSV-facing types keep the `URL,Title,Description,Content` column names
//! used by the search export, hence the serde renames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single article discovered by the search step.
///
/// Records are immutable input. Two records may share a URL; each one is
/// processed on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    /// The (often truncated) article body returned by the search API.
    #[serde(rename = "Content", default)]
    pub api_content: String,
}

/// The best-effort full text of one article.
///
/// Built once per [`ArticleRecord`] and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    /// The URL of the record this document was built from.
    pub source_url: String,
    /// Full scraped text after whitespace and character filtering.
    pub raw_text: String,
    /// Normalized lede: the first sentences of the scraped text.
    pub normalized_text: String,
    /// The candidate chosen for summarization.
    pub final_text: String,
}

impl ResolvedDocument {
    /// Placeholder emitted for a record whose resolution failed.
    pub fn empty(source_url: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            ..Self::default()
        }
    }
}

/// An abstractive summary of one document.
///
/// A non-empty `text` always ends with a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub source_url: String,
    pub text: String,
}

/// Pipeline stage a failure was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolve,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

/// Result of processing a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Resolved,
    Failed { stage: Stage, reason: String },
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RecordOutcome::Resolved)
    }
}

/// Aggregate success/failure tally for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a RecordOutcome>) -> Self {
        let mut report = BatchReport::default();
        for outcome in outcomes {
            report.total += 1;
            if outcome.is_success() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}

/// One row of the tabular content export.
///
/// Column names match the export format consumed by downstream tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRow {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Content")]
    pub content: String,
    pub raw_full_content: String,
    pub spacy_full_content: String,
    pub final_full_content: String,
}

impl ContentRow {
    pub fn new(record: &ArticleRecord, document: &ResolvedDocument) -> Self {
        Self {
            url: record.url.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            content: record.api_content.clone(),
            raw_full_content: document.raw_text.clone(),
            spacy_full_content: document.normalized_text.clone(),
            final_full_content: document.final_text.clone(),
        }
    }
}

/// One document's entry in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub title: String,
    pub document: ResolvedDocument,
    pub outcome: RecordOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_error: Option<String>,
}

/// Everything a run produced, serialized next to the text outputs so each
/// summary can be traced back to the text it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// RFC 3339 local timestamp of the end of the run.
    pub generated_at: String,
    pub query: Option<String>,
    pub resolution: BatchReport,
    pub summaries_written: usize,
    pub summaries_failed: usize,
    pub documents: Vec<DocumentReport>,
}
