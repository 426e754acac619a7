//! Article records and resolved content from CSV files.
//!
//! - [`read_records`]: search exports (`URL,Title,Description,Content`), fed
//!   back through resolution
//! - [`read_final_contents`]: content tables from an earlier run, whose
//!   `final_full_content` column is summarized as-is
//! - [`csv_files`]: every `.csv` file of a directory, in name order

use crate::error::SourceError;
use crate::models::{ArticleRecord, ResolvedDocument};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// The columns of a content table needed to summarize it again.
#[derive(Debug, Deserialize)]
struct ContentCell {
    #[serde(rename = "URL", default)]
    url: String,
    final_full_content: String,
}

impl From<ContentCell> for ResolvedDocument {
    fn from(cell: ContentCell) -> Self {
        ResolvedDocument {
            source_url: cell.url,
            final_text: cell.final_full_content,
            ..ResolvedDocument::default()
        }
    }
}

/// Read every record of a `URL,Title,Description,Content` CSV file.
///
/// Only the `URL` column is required; missing columns and empty cells become
/// empty strings. Extra columns (such as the ones added by the content
/// export) are ignored, so an enriched export can be fed back in.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<ArticleRecord>, SourceError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())?;
    let records = collect_records(reader)?;
    info!(count = records.len(), "Loaded article records");
    Ok(records)
}

fn collect_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<ArticleRecord>, SourceError> {
    let mut records = Vec::new();
    for row in reader.deserialize::<ArticleRecord>() {
        records.push(row?);
    }
    Ok(records)
}

/// Read the `final_full_content` column of a content table.
///
/// # Arguments
///
/// * `path` - CSV file with a `final_full_content` column; `URL` is optional
///
/// # Returns
///
/// One document per row, in file order. Empty cells are kept as documents
/// with empty text so callers can skip them without losing row positions.
///
/// # Errors
///
/// [`SourceError::Csv`] when the file cannot be read or has no
/// `final_full_content` column.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn read_final_contents(path: impl AsRef<Path>) -> Result<Vec<ResolvedDocument>, SourceError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())?;
    let documents = collect_contents(reader)?;
    info!(count = documents.len(), "Loaded resolved content");
    Ok(documents)
}

fn collect_contents<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<ResolvedDocument>, SourceError> {
    let mut documents = Vec::new();
    for row in reader.deserialize::<ContentCell>() {
        documents.push(ResolvedDocument::from(row?));
    }
    Ok(documents)
}

/// List the `.csv` files directly inside `dir`, sorted by path.
pub async fn csv_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, SourceError> {
    let mut entries = fs::read_dir(dir.as_ref()).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    debug!(dir = %dir.as_ref().display(), count = files.len(), "Listed CSV files");
    Ok(files)
}
