//! Abstractive summarization of resolved documents.
//!
//! The [`Summarizer`] drives any [`Seq2SeqModel`]: it cleans the input,
//! refuses documents whose full encoding exceeds the model's positional
//! limit, runs deterministic beam search and guarantees the result ends with
//! a period.
//!
//! # Submodules
//!
//! - [`remote`]: HTTP client for a model server hosting the tokenizer and the
//!   seq2seq model, plus the process-wide shared handle
//! - [`retry`]: exponential backoff decorator for any [`Seq2SeqModel`]
//!
//! One model instance is shared by every call. Inference is gated by a
//! semaphore sized by `model.inference_workers` because concurrent calls into
//! one model instance are not assumed to be safe.

use crate::config::ModelConfig;
use crate::error::{ModelError, SummarizeError};
use crate::models::{ResolvedDocument, Summary};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

pub mod remote;
pub mod retry;

static NON_WORD_OR_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.]").unwrap());

/// Decoding settings passed to [`Seq2SeqModel::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub num_beams: usize,
    pub temperature: f32,
    pub do_sample: bool,
}

impl GenerationParams {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            max_length: config.max_output_tokens,
            num_beams: config.num_beams,
            temperature: config.temperature,
            do_sample: false,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

/// A tokenizer plus sequence-to-sequence model.
pub trait Seq2SeqModel {
    /// Longest input sequence the model's position embeddings can address.
    fn max_position_embeddings(&self) -> usize;

    /// Encode `text` into token ids, truncating to `max_len` tokens when given.
    async fn encode(&self, text: &str, max_len: Option<usize>) -> Result<Vec<u32>, ModelError>;

    /// Generate output token ids for `input_ids`.
    async fn generate(
        &self,
        input_ids: &[u32],
        params: &GenerationParams,
    ) -> Result<Vec<u32>, ModelError>;

    /// Decode token ids to text, skipping special tokens.
    async fn decode(&self, ids: &[u32]) -> Result<String, ModelError>;
}

/// Cleans model input: trim, newlines to spaces, and drop everything except
/// word characters, whitespace and periods.
pub fn prepare_input(text: &str) -> String {
    let text = text.trim().replace('\n', " ");
    NON_WORD_OR_PERIOD.replace_all(&text, "").into_owned()
}

/// Append a period unless `summary` already ends with one.
pub fn ensure_period(mut summary: String) -> String {
    if !summary.ends_with('.') {
        summary.push('.');
    }
    summary
}

/// Summarizes documents with a shared [`Seq2SeqModel`], running at most
/// `inference_workers` model calls at a time.
pub struct Summarizer<M> {
    model: Arc<M>,
    params: GenerationParams,
    max_input_tokens: usize,
    gate: Arc<Semaphore>,
}

impl<M: Seq2SeqModel> Summarizer<M> {
    /// Create a summarizer around a loaded model.
    ///
    /// # Arguments
    ///
    /// * `model` - The process-wide model handle
    /// * `config` - Generation settings, input token budget and the number of
    ///   concurrent inference calls allowed
    pub fn new(model: Arc<M>, config: &ModelConfig) -> Self {
        Self {
            model,
            params: GenerationParams::from_config(config),
            max_input_tokens: config.max_input_tokens,
            gate: Arc::new(Semaphore::new(config.inference_workers.max(1))),
        }
    }

    /// Summarize one text.
    ///
    /// Returns `Ok(None)` without touching the model when there is nothing
    /// left to summarize after cleaning.
    ///
    /// # Errors
    ///
    /// [`SummarizeError::InputTooLong`] when the un-truncated encoding is longer
    /// than the model's position embeddings. The document is not re-chunked.
    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str) -> Result<Option<String>, SummarizeError> {
        let cleaned = prepare_input(text);
        if cleaned.trim().is_empty() {
            debug!("Empty input; nothing to summarize");
            return Ok(None);
        }

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ModelError::Backend(e.to_string()))?;
        let t0 = Instant::now();

        let full = self.model.encode(&cleaned, None).await?;
        let limit = self.model.max_position_embeddings();
        if full.len() > limit {
            return Err(SummarizeError::InputTooLong {
                tokens: full.len(),
                limit,
            });
        }

        let input_ids = if full.len() > self.max_input_tokens {
            self.model
                .encode(&cleaned, Some(self.max_input_tokens))
                .await?
        } else {
            full
        };

        let output_ids = self.model.generate(&input_ids, &self.params).await?;
        let decoded = self.model.decode(&output_ids).await?;
        let decoded = decoded.trim();
        if decoded.is_empty() {
            return Err(SummarizeError::EmptyGeneration);
        }

        let summary = ensure_period(decoded.to_string());
        info!(
            input_tokens = input_ids.len(),
            output_tokens = output_ids.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Generated summary"
        );
        Ok(Some(summary))
    }

    /// Summarize a document's `final_text`.
    ///
    /// # Returns
    ///
    /// The summary tagged with the document's source URL, or `None` when the
    /// document has no text to summarize.
    pub async fn summarize_document(
        &self,
        document: &ResolvedDocument,
    ) -> Result<Option<Summary>, SummarizeError> {
        let text = self.summarize(&document.final_text).await?;
        Ok(text.map(|text| Summary {
            source_url: document.source_url.clone(),
            text,
        }))
    }
}
