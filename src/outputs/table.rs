//! CSV exports.

use serde::Serialize;
use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::{debug, instrument};

/// Writes serializable rows to CSV, one flushed row at a time.
///
/// The header comes from the first row's field names.
pub struct TableWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl TableWriter<File> {
    /// Create (or truncate) the CSV file at `path`, creating parent directories.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self::from_writer(File::create(path.as_ref())?))
    }
}

impl<W: Write> TableWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            rows: 0,
        }
    }

    pub fn write_row<T: Serialize>(&mut self, row: &T) -> Result<(), Box<dyn Error>> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        self.rows += 1;
        debug!(rows = self.rows, "Wrote CSV row");
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Result<W, Box<dyn Error>> {
        self.writer.into_inner().map_err(|e| e.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleRecord, ContentRow, ResolvedDocument};

    fn record() -> ArticleRecord {
        ArticleRecord {
            url: "https://a.test/1".to_string(),
            title: "Title, with comma".to_string(),
            description: "Desc".to_string(),
            api_content: "Content".to_string(),
        }
    }

    #[test]
    fn test_content_table_columns() {
        let doc = ResolvedDocument {
            source_url: "https://a.test/1".to_string(),
            raw_text: "Raw text.".to_string(),
            normalized_text: "Lede.".to_string(),
            final_text: "Lede.".to_string(),
        };
        let mut table = TableWriter::from_writer(Vec::new());
        table.write_row(&ContentRow::new(&record(), &doc)).unwrap();
        assert_eq!(table.rows(), 1);

        let out = String::from_utf8(table.into_inner().unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("URL,Title,Description,Content,raw_full_content,spacy_full_content,final_full_content")
        );
        assert_eq!(
            lines.next(),
            Some("https://a.test/1,\"Title, with comma\",Desc,Content,Raw text.,Lede.,Lede.")
        );
    }

    #[test]
    fn test_search_export_round_trips_through_csv_input() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut table = TableWriter::create(file.path()).unwrap();
        table.write_row(&record()).unwrap();
        drop(table);

        let records = crate::sources::csv_input::read_records(file.path()).unwrap();
        assert_eq!(records, vec![record()]);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw").join("articles.csv");
        let mut table = TableWriter::create(&path).unwrap();
        table.write_row(&record()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_no_rows_writes_nothing() {
        let table = TableWriter::from_writer(Vec::new());
        assert!(table.into_inner().unwrap().is_empty());
    }
}
