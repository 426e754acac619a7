//! Command-line interface definitions for newsdigest.
//!
//! Articles come either from a news search (`--query`) or from a CSV file
//! exported by an earlier run (`--input`). `--summarize-dir` skips search and
//! resolution altogether and summarizes the content tables of a directory.
//! Everything else is optional and overrides the matching setting of the YAML
//! config file.

use chrono::NaiveDate;
use clap::{ArgGroup, Parser};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Search the last 30 days and summarize the results
/// newsdigest --query "heat wave" -o ./dataset
///
/// # Re-run resolution and summaries for a previous search export
/// newsdigest --input ./dataset/raw/articles.csv --model-endpoint http://gpu:8080
///
/// # Summarize already resolved content, one summary file per CSV
/// newsdigest --summarize-dir ./dataset/topics -o ./dataset
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["query", "input", "summarize_dir"])))]
pub struct Cli {
    /// Search query sent to the news API
    #[arg(short, long)]
    pub query: Option<String>,

    /// CSV file with URL,Title,Description,Content columns to use instead of searching
    #[arg(short, long)]
    pub input: Option<String>,

    /// Directory of content tables (CSV with a final_full_content column) to
    /// summarize without searching or scraping
    #[arg(long, conflicts_with = "skip_summaries")]
    pub summarize_dir: Option<String>,

    /// First publication date to search (YYYY-MM-DD); defaults to the configured lookback
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last publication date to search (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Two-letter language code for the search
    #[arg(long, value_parser = parse_language)]
    pub language: Option<String>,

    /// Number of search results to request
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Directory receiving the CSV exports, summaries and run reports
    #[arg(short, long, default_value = "dataset")]
    pub output_dir: String,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// News API key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Base URL of the summarization model server
    #[arg(long, env = "NEWSDIGEST_MODEL_ENDPOINT")]
    pub model_endpoint: Option<String>,

    /// Number of articles resolved concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Request timeout for publisher pages, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Resolve article content but do not generate summaries
    #[arg(long)]
    pub skip_summaries: bool,
}

fn parse_language(value: &str) -> Result<String, String> {
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(format!("expected a two-letter language code, got {value:?}"))
    }
}
