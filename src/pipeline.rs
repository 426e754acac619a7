//! Batch driver for content resolution.
//!
//! Every record is resolved exactly once, concurrently, on a bounded number
//! of in-flight requests. A failing record never stops the batch: it is
//! emitted with an empty document and a [`RecordOutcome::Failed`], and counted
//! in the [`BatchReport`].

use crate::models::{ArticleRecord, BatchReport, RecordOutcome, ResolvedDocument, Stage};
use crate::resolve::CandidateResolver;
use crate::scrapers::PageFetcher;
use crate::segment::SentenceSegmenter;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{error, info, instrument};

/// Resolved documents in input order, with per-record outcomes.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub documents: Vec<(ResolvedDocument, RecordOutcome)>,
    pub report: BatchReport,
}

/// Runs a [`CandidateResolver`] over a batch of records.
///
/// At most `workers` records are in flight at once. Results are tagged with
/// their input index and re-sorted, so completion order never leaks into the
/// output.
pub struct DocumentPipeline<F, S> {
    resolver: CandidateResolver<F, S>,
    workers: usize,
}

impl<F, S> DocumentPipeline<F, S>
where
    F: PageFetcher,
    S: SentenceSegmenter,
{
    /// Create a pipeline.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Resolver applied to every record
    /// * `workers` - Maximum records resolved concurrently; `0` is treated as `1`
    pub fn new(resolver: CandidateResolver<F, S>, workers: usize) -> Self {
        Self {
            resolver,
            workers: workers.max(1),
        }
    }

    /// Resolve every record, returning results in input order.
    ///
    /// # Returns
    ///
    /// One `(document, outcome)` pair per record, in input order, and the
    /// aggregate [`BatchReport`]. Failed records carry an empty document.
    #[instrument(level = "info", skip_all, fields(records = records.len(), workers = self.workers))]
    pub async fn process(&self, records: &[ArticleRecord]) -> PipelineOutput {
        let t0 = Instant::now();
        info!("Resolving article content");

        let mut tagged: Vec<(usize, ResolvedDocument, RecordOutcome)> = stream::iter(records.iter().enumerate())
            .map(|(index, record)| async move {
                let (document, outcome) = self.process_one(index, record).await;
                (index, document, outcome)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;
        tagged.sort_by_key(|(index, _, _)| *index);

        let documents: Vec<(ResolvedDocument, RecordOutcome)> = tagged
            .into_iter()
            .map(|(_, document, outcome)| (document, outcome))
            .collect();
        let report = BatchReport::from_outcomes(documents.iter().map(|(_, outcome)| outcome));

        info!(
            total = report.total,
            successful = report.succeeded,
            failed = report.failed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Completed content resolution"
        );
        PipelineOutput { documents, report }
    }

    async fn process_one(
        &self,
        index: usize,
        record: &ArticleRecord,
    ) -> (ResolvedDocument, RecordOutcome) {
        match self.resolver.resolve(record).await {
            Ok(document) => {
                info!(index, url = %record.url, chars = document.final_text.chars().count(), "Resolved article");
                (document, RecordOutcome::Resolved)
            }
            Err(e) => {
                error!(index, url = %record.url, stage = %Stage::Resolve, error = %e, "Resolution failed; emitting empty document");
                (
                    ResolvedDocument::empty(&record.url),
                    RecordOutcome::Failed {
                        stage: Stage::Resolve,
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::tests::MockFetcher;
    use crate::segment::UnicodeSentences;

    fn record(url: &str, description: &str) -> ArticleRecord {
        ArticleRecord {
            url: url.to_string(),
            title: String::new(),
            description: description.to_string(),
            api_content: String::new(),
        }
    }

    fn pipeline(fetcher: MockFetcher, workers: usize) -> DocumentPipeline<MockFetcher, UnicodeSentences> {
        DocumentPipeline::new(CandidateResolver::new(fetcher, UnicodeSentences), workers)
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let output = pipeline(MockFetcher::default(), 4).process(&[]).await;
        assert!(output.documents.is_empty());
        assert_eq!(output.report, BatchReport::default());
    }

    #[tokio::test]
    async fn test_failing_record_is_isolated() {
        let fetcher = MockFetcher::default()
            .page("https://a.test/1", "First story.")
            .page("https://a.test/3", "Third story.");
        let records = vec![
            record("https://a.test/1", ""),
            record("not a url", "would have been chosen"),
            record("https://a.test/3", ""),
            record("https://a.test/4", "fallback description"),
        ];

        let output = pipeline(fetcher, 2).process(&records).await;

        assert_eq!(output.report.total, 4);
        assert_eq!(output.report.failed, 1);
        assert_eq!(output.report.succeeded, 3);

        let (doc, outcome) = &output.documents[1];
        assert_eq!(doc.source_url, "not a url");
        assert!(doc.final_text.is_empty());
        assert!(matches!(outcome, RecordOutcome::Failed { stage: Stage::Resolve, .. }));

        assert_eq!(output.documents[0].0.final_text, "First story.");
        assert_eq!(output.documents[2].0.final_text, "Third story.");
        assert_eq!(output.documents[3].0.final_text, "fallback description");
        for i in [0, 2, 3] {
            assert!(output.documents[i].1.is_success());
        }
    }

    #[tokio::test]
    async fn test_preserves_input_order_and_duplicates() {
        let mut fetcher = MockFetcher::default();
        let mut records = Vec::new();
        for i in 0..20 {
            let url = format!("https://a.test/{i}");
            fetcher = fetcher.page(&url, &format!("Story number {i}."));
            records.push(record(&url, ""));
        }
        records.push(record("https://a.test/0", ""));

        let output = pipeline(fetcher, 5).process(&records).await;

        assert_eq!(output.documents.len(), 21);
        for (i, (doc, _)) in output.documents.iter().take(20).enumerate() {
            assert_eq!(doc.source_url, format!("https://a.test/{i}"));
            assert_eq!(doc.final_text, format!("Story number {i}."));
        }
        assert_eq!(output.documents[20].0.final_text, "Story number 0.");
        assert_eq!(output.report.succeeded, 21);
    }

    #[tokio::test]
    async fn test_zero_workers_still_processes() {
        let fetcher = MockFetcher::default().page("https://a.test/1", "Body.");
        let output = pipeline(fetcher, 0).process(&[record("https://a.test/1", "")]).await;
        assert_eq!(output.report.succeeded, 1);
    }
}
