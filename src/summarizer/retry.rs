//! Exponential backoff for model calls.
//!
//! [`RetryModel`] wraps any [`Seq2SeqModel`] and retries transient failures
//! (connection errors, timeouts, 429 and 5xx answers from the model server).
//! The delay between attempts follows:
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use super::{GenerationParams, Seq2SeqModel};
use crate::error::ModelError;
use rand::{rng, Rng};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// Upper bound for a single backoff delay.
pub const MAX_DELAY: Duration = Duration::from_secs(30);

/// Decorator retrying transient failures of the wrapped model.
pub struct RetryModel<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryModel<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: MAX_DELAY,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    async fn with_backoff<R, F, Fut>(&self, op: &'static str, call: F) -> Result<R, ModelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, ModelError>>,
    {
        retry_transient(op, self.max_retries, self.base_delay, self.max_delay, call).await
    }
}

/// Run `call` until it succeeds, fails permanently or runs out of retries.
///
/// # Arguments
///
/// * `op` - Operation name used in logs
/// * `max_retries` - Retries after the first attempt
/// * `base_delay` - Delay before the first retry; doubled for each following one
/// * `max_delay` - Upper bound for the delay, before jitter
/// * `call` - Produces a fresh attempt each time it is invoked
///
/// # Returns
///
/// The first successful value, or the last error. Errors for which
/// [`ModelError::is_transient`] is false are returned immediately.
pub async fn retry_transient<R, F, Fut>(
    op: &'static str,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    mut call: F,
) -> Result<R, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, ModelError>>,
{
    let total_t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                let total_ms = total_t0.elapsed().as_millis() as u64;

                if !e.is_transient() || attempt > max_retries {
                    error!(op, attempt, max = max_retries, elapsed_ms_total = total_ms, error = %e, "Model call failed");
                    return Err(e);
                }

                let delay = backoff_delay(base_delay, max_delay, attempt)
                    + Duration::from_millis(rng().random_range(0..=250));
                warn!(op, attempt, max = max_retries, elapsed_ms_total = total_ms, ?delay, error = %e, "Model call failed; backing off");
                sleep(delay).await;
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based), without jitter.
fn backoff_delay(base: Duration, max: Duration, attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    base.saturating_mul(1 << shift).min(max)
}

impl<T> fmt::Debug for RetryModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryModel")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: Seq2SeqModel> Seq2SeqModel for RetryModel<T> {
    fn max_position_embeddings(&self) -> usize {
        self.inner.max_position_embeddings()
    }

    async fn encode(&self, text: &str, max_len: Option<usize>) -> Result<Vec<u32>, ModelError> {
        self.with_backoff("encode", || self.inner.encode(text, max_len))
            .await
    }

    async fn generate(
        &self,
        input_ids: &[u32],
        params: &GenerationParams,
    ) -> Result<Vec<u32>, ModelError> {
        self.with_backoff("generate", || self.inner.generate(input_ids, params))
            .await
    }

    async fn decode(&self, ids: &[u32]) -> Result<String, ModelError> {
        self.with_backoff("decode", || self.inner.decode(ids)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls with the given error kind.
    struct Flaky {
        failures: usize,
        transient: bool,
        calls: AtomicUsize,
    }

    impl Flaky {
        fn new(failures: usize, transient: bool) -> Self {
            Self {
                failures,
                transient,
                calls: AtomicUsize::new(0),
            }
        }

        fn attempt(&self) -> Result<(), ModelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                let status = if self.transient { 503 } else { 400 };
                return Err(ModelError::Server {
                    status,
                    body: "nope".to_string(),
                });
            }
            Ok(())
        }
    }

    impl Seq2SeqModel for Flaky {
        fn max_position_embeddings(&self) -> usize {
            512
        }

        async fn encode(&self, _text: &str, _max_len: Option<usize>) -> Result<Vec<u32>, ModelError> {
            self.attempt().map(|_| vec![5, 1])
        }

        async fn generate(&self, _ids: &[u32], _p: &GenerationParams) -> Result<Vec<u32>, ModelError> {
            self.attempt().map(|_| vec![7, 1])
        }

        async fn decode(&self, _ids: &[u32]) -> Result<String, ModelError> {
            self.attempt().map(|_| "ok".to_string())
        }
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(30);
        assert_eq!(backoff_delay(base, max, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, max, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, max, 5), Duration::from_secs(16));
        assert_eq!(backoff_delay(base, max, 6), Duration::from_secs(30));
        assert_eq!(backoff_delay(base, max, 500), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let model = RetryModel::new(Flaky::new(2, true), 5, Duration::from_secs(1));
        let ids = model.generate(&[3, 1], &GenerationParams::default()).await.unwrap();
        assert_eq!(ids, vec![7, 1]);
        assert_eq!(model.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let model = RetryModel::new(Flaky::new(10, true), 2, Duration::from_millis(10));
        assert!(model.encode("x", None).await.is_err());
        assert_eq!(model.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_client_errors() {
        let model = RetryModel::new(Flaky::new(1, false), 5, Duration::from_secs(1));
        let err = model.decode(&[1]).await.unwrap_err();
        assert!(matches!(err, ModelError::Server { status: 400, .. }));
        assert_eq!(model.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_transient_waits_for_loading_server() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let value = retry_transient("connect", 5, Duration::from_secs(1), MAX_DELAY, || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(ModelError::Server {
                    status: 503,
                    body: "loading".to_string(),
                })
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_transient_stops_on_permanent_error() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<(), ModelError> =
            retry_transient("connect", 5, Duration::from_secs(1), MAX_DELAY, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ModelError::Backend("bad endpoint".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_passes_through_position_limit() {
        let model = RetryModel::new(Flaky::new(0, true), 1, Duration::from_secs(1));
        assert_eq!(model.max_position_embeddings(), 512);
    }
}
