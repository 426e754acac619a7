//! Small helpers for logging and output directory checks.

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and the number of dropped bytes appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a check file.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn ensure_writable_dir(path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let check_path = path.join("..__write_check__");
    stdfs::File::create(&check_path)?;
    let _ = stdfs::remove_file(&check_path);
    info!("Output directory is writable");
    Ok(())
}
