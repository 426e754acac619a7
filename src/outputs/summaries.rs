//! Plain-text summary output.
//!
//! One summary per line, in input order. Documents without a summary get no
//! line at all, not even a blank one.

use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Append-only writer for a summary file.
///
/// Every [`SummaryWriter::append`] writes one complete line and flushes it,
/// so an interrupted run leaves only whole lines behind.
pub struct SummaryWriter {
    file: File,
    path: PathBuf,
    lines: usize,
}

impl SummaryWriter {
    /// Create (or truncate) the summary file, creating parent directories.
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file, e.g. `summaries/summaries.txt`
    ///
    /// # Returns
    ///
    /// A writer positioned at the start of the empty file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = File::create(&path).await?;
        info!("Writing summaries");
        Ok(Self {
            file,
            path,
            lines: 0,
        })
    }

    /// Append one summary line and flush it.
    ///
    /// Newlines inside `summary` are folded into spaces so each summary stays
    /// on exactly one line.
    pub async fn append(&mut self, summary: &str) -> Result<(), Box<dyn Error>> {
        let line = format!("{}\n", single_line(summary));
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        self.lines += 1;
        debug!(lines = self.lines, "Appended summary");
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Keep a summary on one line whatever the model emitted.
fn single_line(summary: &str) -> String {
    summary.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_line_per_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summaries").join("summaries.txt");

        let mut writer = SummaryWriter::create(&path).await.unwrap();
        writer.append("First summary.").await.unwrap();
        writer.append("Second\nsummary  spans lines.").await.unwrap();
        assert_eq!(writer.lines(), 2);
        assert_eq!(writer.path(), path.as_path());

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "First summary.\nSecond summary spans lines.\n");
    }

    #[tokio::test]
    async fn test_create_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summaries.txt");
        tokio::fs::write(&path, "stale line.\n").await.unwrap();

        let writer = SummaryWriter::create(&path).await.unwrap();
        drop(writer);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "");
    }
}
