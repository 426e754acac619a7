//! # newsdigest
//!
//! Finds news articles for a search query, resolves each article's full text
//! from the live web, reconciles it with the shorter text returned by the
//! search API and writes an abstractive summary per article.
//!
//! ## Usage
//!
//! ```sh
//! newsdigest --query "heat wave" -o ./dataset
//! newsdigest --summarize-dir ./dataset/topics -o ./dataset
//! ```
//!
//! ## Architecture
//!
//! 1. **Search**: fetch article records from NewsAPI (or read them from CSV)
//! 2. **Resolution**: follow redirects, scrape, normalize and pick the best
//!    candidate text per article (parallel, bounded)
//! 3. **Summarization**: one beam-search summary per document through the
//!    shared model, serialized per model instance
//! 4. **Output**: content CSV, summary lines and a JSON run report
//!
//! With `--summarize-dir`, steps 1 and 2 are skipped: the `final_full_content`
//! column of every CSV in the directory is summarized into
//! `multi-summaries/<name>.txt`.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod resolve;
mod scrapers;
mod segment;
mod select;
mod sources;
mod summarizer;
mod utils;

use cli::Cli;
use config::Config;
use error::{ModelError, SummarizeError};
use models::{
    ArticleRecord, ContentRow, DocumentReport, RecordOutcome, ResolvedDocument, RunReport, Stage,
};
use outputs::summaries::SummaryWriter;
use outputs::table::TableWriter;
use pipeline::DocumentPipeline;
use resolve::CandidateResolver;
use scrapers::web::WebScraper;
use segment::UnicodeSentences;
use sources::csv_input::{csv_files, read_final_contents, read_records};
use sources::newsapi::{NewsApiClient, SearchQuery};
use summarizer::{prepare_input, remote, Seq2SeqModel, Summarizer};
use utils::{ensure_writable_dir, truncate_for_log};

/// What happened when summarizing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SummaryOutcome {
    Written(String),
    Skipped,
    Failed(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsdigest starting up");

    if dotenvy::dotenv().is_ok() {
        debug!("Loaded .env");
    }

    let args = Cli::parse();
    debug!(?args.query, ?args.input, ?args.summarize_dir, output_dir = %args.output_dir, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_cli(&args);

    let output_dir = PathBuf::from(&args.output_dir);
    if let Err(e) = ensure_writable_dir(&output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Summaries of already resolved content ----
    if let Some(input_dir) = &args.summarize_dir {
        let model = remote::shared(&config.model).await?;
        info!(model_id = %model.inner().info().model_id, "Using summarization model");
        let summarizer = Summarizer::new(model, &config.model);
        let files = summarize_directory(
            &summarizer,
            Path::new(input_dir),
            &output_dir.join("multi-summaries"),
        )
        .await?;

        let outcomes = files.iter().flat_map(|(_, outcomes)| outcomes);
        let (written, failed) = tally(outcomes);
        let elapsed = start_time.elapsed();
        info!(?elapsed, files = files.len(), summaries_written = written, summaries_failed = failed, "Execution complete");
        return Ok(());
    }

    // ---- Article records ----
    let records = load_records(&args, &config, &output_dir).await?;
    if records.is_empty() {
        warn!("No articles retrieved; nothing to do");
        return Ok(());
    }

    // ---- Content resolution ----
    let scraper = WebScraper::new(&config.http)?;
    let resolver = CandidateResolver::new(scraper, UnicodeSentences)
        .with_max_sentences(config.resolver.main_content_sentences);
    let pipeline = DocumentPipeline::new(resolver, config.resolver.workers);
    let resolved = pipeline.process(&records).await;

    let content_path = output_dir.join("raw").join("articles_with_full_content.csv");
    let mut table = TableWriter::create(&content_path)?;
    for (record, (document, _)) in records.iter().zip(&resolved.documents) {
        table.write_row(&ContentRow::new(record, document))?;
    }
    info!(path = %content_path.display(), rows = table.rows(), "Content table written");

    // ---- Summaries ----
    let documents: Vec<&ResolvedDocument> =
        resolved.documents.iter().map(|(document, _)| document).collect();
    let mut model_error: Option<ModelError> = None;
    let summary_outcomes = if args.skip_summaries {
        info!("Skipping summaries");
        vec![SummaryOutcome::Skipped; documents.len()]
    } else {
        match remote::shared(&config.model).await {
            Ok(model) => {
                info!(model_id = %model.inner().info().model_id, "Using summarization model");
                let summarizer = Summarizer::new(model, &config.model);
                let mut writer =
                    SummaryWriter::create(output_dir.join("summaries").join("summaries.txt")).await?;
                summarize_all(&summarizer, &documents, &mut writer).await?
            }
            Err(e) => {
                error!(stage = %Stage::Summarize, error = %e, "Summarization model unavailable; recording summaries as failed");
                let outcomes = unsummarized(&documents, &e.to_string());
                model_error = Some(e);
                outcomes
            }
        }
    };

    let (summaries_written, summaries_failed) = tally(&summary_outcomes);

    // ---- Run report ----
    let now = Local::now();
    let report = RunReport {
        generated_at: now.to_rfc3339(),
        query: args.query.clone(),
        resolution: resolved.report,
        summaries_written,
        summaries_failed,
        documents: build_document_reports(&records, resolved.documents, summary_outcomes),
    };
    if let Err(e) = outputs::json::write_report(&report, output_dir.join("reports"), now).await {
        error!(error = %e, "Failed to write run report");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = report.resolution.total,
        resolved = report.resolution.succeeded,
        resolution_failures = report.resolution.failed,
        summaries_written,
        summaries_failed,
        "Execution complete"
    );

    match model_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Read records from `--input`, or search and export the results.
#[instrument(level = "info", skip_all)]
async fn load_records(
    args: &Cli,
    config: &Config,
    output_dir: &Path,
) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
    if let Some(input) = &args.input {
        return Ok(read_records(input)?);
    }

    let query_text = args.query.as_deref().unwrap_or_default();
    let client = NewsApiClient::new(args.news_api_key.clone(), &config.search)?;
    let query = SearchQuery::new(query_text, args.from, args.to, &config.search)?;
    if query.from > query.to {
        warn!(from = %query.from, to = %query.to, "Search window is empty");
    }
    let records = client.search(&query).await?;

    if !records.is_empty() {
        let export_path = output_dir.join("raw").join("articles.csv");
        let mut table = TableWriter::create(&export_path)?;
        for record in &records {
            table.write_row(record)?;
        }
        info!(path = %export_path.display(), rows = table.rows(), "Search results written");
    }

    Ok(records)
}

/// Summarize documents in input order, appending each summary as soon as it
/// is produced.
///
/// A document that cannot be summarized is logged and skipped; only failing
/// to write the summary file stops the loop.
#[instrument(level = "info", skip_all, fields(documents = documents.len()))]
async fn summarize_all<M: Seq2SeqModel>(
    summarizer: &Summarizer<M>,
    documents: &[&ResolvedDocument],
    writer: &mut SummaryWriter,
) -> Result<Vec<SummaryOutcome>, Box<dyn Error>> {
    let mut outcomes = Vec::with_capacity(documents.len());

    for (index, document) in documents.iter().enumerate() {
        let outcome = match summarizer.summarize_document(document).await {
            Ok(Some(summary)) => {
                writer.append(&summary.text).await?;
                debug!(index, url = %summary.source_url, summary = %truncate_for_log(&summary.text, 120), "Wrote summary");
                SummaryOutcome::Written(summary.text)
            }
            Ok(None) => {
                debug!(index, url = %document.source_url, "No content to summarize; skipping");
                SummaryOutcome::Skipped
            }
            Err(e @ SummarizeError::InputTooLong { .. }) => {
                warn!(index, url = %document.source_url, stage = %Stage::Summarize, error = %e, "Input is too long; skipping document");
                SummaryOutcome::Failed(e.to_string())
            }
            Err(e) => {
                error!(index, url = %document.source_url, stage = %Stage::Summarize, error = %e, "Summarization failed; skipping document");
                SummaryOutcome::Failed(e.to_string())
            }
        };
        outcomes.push(outcome);
    }

    info!(
        written = writer.lines(),
        path = %writer.path().display(),
        "Summaries complete"
    );
    Ok(outcomes)
}

/// Summarize the `final_full_content` column of every CSV in `input_dir`.
///
/// # Arguments
///
/// * `summarizer` - Shared summarizer
/// * `input_dir` - Directory of content tables; only its `.csv` files are read
/// * `output_dir` - Receives one `<name>.txt` per CSV, one summary per line
///
/// # Returns
///
/// The summary file written for each CSV with its per-row outcomes. A CSV
/// that cannot be read is logged and left out; writing a summary file is the
/// only error that stops the run.
#[instrument(level = "info", skip_all, fields(input_dir = %input_dir.display()))]
async fn summarize_directory<M: Seq2SeqModel>(
    summarizer: &Summarizer<M>,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<(PathBuf, Vec<SummaryOutcome>)>, Box<dyn Error>> {
    let files = csv_files(input_dir).await?;
    if files.is_empty() {
        warn!("No CSV files to summarize");
    }

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let documents = match read_final_contents(&file) {
            Ok(documents) => documents,
            Err(e) => {
                error!(file = %file.display(), error = %e, "Skipping unreadable content table");
                continue;
            }
        };
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let summary_path = output_dir.join(format!("{stem}.txt"));

        let mut writer = SummaryWriter::create(&summary_path).await?;
        let refs: Vec<&ResolvedDocument> = documents.iter().collect();
        let outcomes = summarize_all(summarizer, &refs, &mut writer).await?;
        info!(file = %file.display(), summaries = %summary_path.display(), "Summary generation completed");
        results.push((summary_path, outcomes));
    }

    Ok(results)
}

/// Outcomes for documents that never reached the model.
///
/// Documents with nothing to summarize stay skipped; every other one is
/// recorded as failed with `reason`.
fn unsummarized(documents: &[&ResolvedDocument], reason: &str) -> Vec<SummaryOutcome> {
    documents
        .iter()
        .map(|document| {
            if prepare_input(&document.final_text).trim().is_empty() {
                SummaryOutcome::Skipped
            } else {
                SummaryOutcome::Failed(reason.to_string())
            }
        })
        .collect()
}

/// Count written and failed summaries.
fn tally<'a>(outcomes: impl IntoIterator<Item = &'a SummaryOutcome>) -> (usize, usize) {
    outcomes
        .into_iter()
        .fold((0, 0), |(written, failed), outcome| match outcome {
            SummaryOutcome::Written(_) => (written + 1, failed),
            SummaryOutcome::Failed(_) => (written, failed + 1),
            SummaryOutcome::Skipped => (written, failed),
        })
}

fn build_document_reports(
    records: &[ArticleRecord],
    documents: Vec<(ResolvedDocument, RecordOutcome)>,
    summaries: Vec<SummaryOutcome>,
) -> Vec<DocumentReport> {
    records
        .iter()
        .zip(documents)
        .zip(summaries)
        .map(|((record, (document, outcome)), summary)| {
            let (summary, summary_error) = match summary {
                SummaryOutcome::Written(text) => (Some(text), None),
                SummaryOutcome::Skipped => (None, None),
                SummaryOutcome::Failed(reason) => (None, Some(reason)),
            };
            DocumentReport {
                title: record.title.clone(),
                document,
                outcome,
                summary,
                summary_error,
            }
        })
        .collect()
}
