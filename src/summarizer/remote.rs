//! Client for a model server hosting the summarization tokenizer and model.
//!
//! The server exposes four JSON endpoints under a base URL:
//!
//! | Method | Path        | Request                                   | Response                              |
//! |--------|-------------|-------------------------------------------|---------------------------------------|
//! | GET    | `info`      |                                           | `{model_id, max_position_embeddings}` |
//! | POST   | `tokenize`  | `{text, truncation, max_length}`          | `{ids}`                               |
//! | POST   | `generate`  | `{input_ids, max_length, num_beams, ...}` | `{output_ids}`                        |
//! | POST   | `decode`    | `{ids, skip_special_tokens}`              | `{text}`                              |
//!
//! The model is loaded once per process: [`shared`] connects on first use and
//! hands out the same [`SharedModel`] afterwards. It is never torn down.

use super::retry::{retry_transient, RetryModel, MAX_DELAY};
use super::{GenerationParams, Seq2SeqModel};
use crate::config::ModelConfig;
use crate::error::ModelError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, instrument};
use url::Url;

/// The model handle shared by every summarization call.
pub type SharedModel = RetryModel<RemoteSeq2Seq>;

static MODEL: OnceCell<Arc<SharedModel>> = OnceCell::const_new();

/// Delay before the first retry of any model call.
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Connect to the model server on first call; later calls reuse the handle
/// and ignore `config`.
///
/// A server that is still loading its weights typically refuses connections
/// or answers 503, so the initial `info` call backs off like every other
/// model call.
///
/// # Errors
///
/// The last [`ModelError`] once `config.max_retries` retries are used up, or
/// the first permanent one.
pub async fn shared(config: &ModelConfig) -> Result<Arc<SharedModel>, ModelError> {
    MODEL
        .get_or_try_init(|| async {
            let remote = connect_with_backoff(config).await?;
            Ok::<_, ModelError>(Arc::new(RetryModel::new(
                remote,
                config.max_retries,
                BASE_DELAY,
            )))
        })
        .await
        .cloned()
}

async fn connect_with_backoff(config: &ModelConfig) -> Result<RemoteSeq2Seq, ModelError> {
    retry_transient("connect", config.max_retries, BASE_DELAY, MAX_DELAY, || {
        RemoteSeq2Seq::connect(config)
    })
    .await
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub max_position_embeddings: usize,
}

#[derive(Debug, Serialize)]
struct TokenizeRequest<'a> {
    text: &'a str,
    truncation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TokenizeResponse {
    ids: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    input_ids: &'a [u32],
    #[serde(flatten)]
    params: &'a GenerationParams,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    output_ids: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct DecodeRequest<'a> {
    ids: &'a [u32],
    skip_special_tokens: bool,
}

#[derive(Debug, Deserialize)]
struct DecodeResponse {
    text: String,
}

#[derive(Debug)]
pub struct RemoteSeq2Seq {
    client: Client,
    endpoint: Url,
    info: ModelInfo,
}

impl RemoteSeq2Seq {
    /// Connect to the server and read the model's limits.
    #[instrument(level = "info", skip_all, fields(endpoint = %config.endpoint))]
    pub async fn connect(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = parse_endpoint(&config.endpoint)?;

        let info: ModelInfo = send_json(client.get(join(&endpoint, "info")?)).await?;
        info!(
            model_id = %info.model_id,
            max_position_embeddings = info.max_position_embeddings,
            "Model loaded"
        );

        Ok(Self {
            client,
            endpoint,
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ModelError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = join(&self.endpoint, path)?;
        send_json(self.client.post(url).json(body)).await
    }
}

impl Seq2SeqModel for RemoteSeq2Seq {
    fn max_position_embeddings(&self) -> usize {
        self.info.max_position_embeddings
    }

    async fn encode(&self, text: &str, max_len: Option<usize>) -> Result<Vec<u32>, ModelError> {
        let request = TokenizeRequest {
            text,
            truncation: max_len.is_some(),
            max_length: max_len,
        };
        let response: TokenizeResponse = self.post("tokenize", &request).await?;
        Ok(response.ids)
    }

    async fn generate(
        &self,
        input_ids: &[u32],
        params: &GenerationParams,
    ) -> Result<Vec<u32>, ModelError> {
        let request = GenerateRequest { input_ids, params };
        let response: GenerateResponse = self.post("generate", &request).await?;
        Ok(response.output_ids)
    }

    async fn decode(&self, ids: &[u32]) -> Result<String, ModelError> {
        let request = DecodeRequest {
            ids,
            skip_special_tokens: true,
        };
        let response: DecodeResponse = self.post("decode", &request).await?;
        Ok(response.text)
    }
}

/// Parse the base URL, making sure relative joins stay under its path.
fn parse_endpoint(raw: &str) -> Result<Url, ModelError> {
    let mut base = raw.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| ModelError::Backend(format!("invalid model endpoint {raw:?}: {e}")))
}

fn join(endpoint: &Url, path: &str) -> Result<Url, ModelError> {
    endpoint
        .join(path)
        .map_err(|e| ModelError::Backend(format!("invalid model path {path:?}: {e}")))
}

async fn send_json<Resp: DeserializeOwned>(request: RequestBuilder) -> Result<Resp, ModelError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("unknown error"));
        return Err(ModelError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<Resp>().await?)
}
