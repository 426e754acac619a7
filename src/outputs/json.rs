//! JSON run report.
//!
//! Reports are grouped by date, one file per run named after the local time
//! the run finished:
//! ```text
//! reports_dir/
//! └── 2025-05-06/
//!     ├── 081502.json
//!     └── 203000.json
//! ```

use crate::models::RunReport;
use chrono::{DateTime, Local};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `report` under `reports_dir/{date}/{HHMMSS}.json`.
///
/// Returns the path of the written file.
#[instrument(level = "info", skip_all, fields(reports_dir = %reports_dir.as_ref().display()))]
pub async fn write_report(
    report: &RunReport,
    reports_dir: impl AsRef<Path>,
    now: DateTime<Local>,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let full_dir = reports_dir
        .as_ref()
        .join(now.date_naive().format("%Y-%m-%d").to_string());
    info!(dir = %full_dir.display(), "Ensuring report directory exists");
    if let Err(e) = fs::create_dir_all(&full_dir).await {
        error!(dir = %full_dir.display(), error = %e, "Failed to create report dir");
        return Err(e.into());
    }

    let path = full_dir.join(format!("{}.json", now.format("%H%M%S")));
    fs::write(&path, json).await?;
    info!(path = %path.display(), documents = report.documents.len(), "Wrote run report");
    Ok(path)
}
