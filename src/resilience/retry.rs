use std::future::Future;

use tokio::time::sleep;

use crate::error::FanoutError;

use super::policy::RetryPolicy;

/// A successful value and the number of attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: usize,
}

impl RetryPolicy {
    /// Runs `op` until it succeeds, fails with a non-retryable error or the
    /// attempts run out. The last error is returned on exhaustion.
    pub async fn retry<F, Fut, T>(&self, mut op: F) -> Result<Retried<T>, FanoutError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FanoutError>>,
    {
        let mut attempt = 0usize;
        while attempt < self.max_attempts {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    return Ok(Retried {
                        value,
                        attempts: attempt,
                    })
                }
                Err(err) => {
                    if attempt == self.max_attempts || !self.is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.backoff_delay(attempt - 1);
                    log::warn!("attempt {attempt} failed ({err}); retrying in {delay:?}");
                    sleep(delay).await;
                }
            }
        }

        Err(FanoutError::RetryExceeded {
            attempts: self.max_attempts,
            last_error: "no attempt was made".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ErrorKind;

    fn fast() -> RetryPolicy {
        RetryPolicy::defaults().backoff(0, 0).jitter(false)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = fast()
            .retry(move || async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(FanoutError::RateLimited("429".into())),
                    1 => Err(FanoutError::HttpError("reset".into())),
                    _ => Ok("done"),
                }
            })
            .await
            .unwrap();
        assert_eq!(result.value, "done");
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let err = fast()
            .retry(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FanoutError::AuthError("bad key".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn returns_last_error_when_attempts_run_out() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let err = fast()
            .max_attempts(2)
            .retry(move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FanoutError::ProviderError(format!("503 #{n}")))
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Provider error: 503 #1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_attempts_reports_retry_exceeded() {
        let err = fast()
            .max_attempts(0)
            .retry(|| async { Ok::<_, FanoutError>(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, FanoutError::RetryExceeded { attempts: 0, .. }));
    }
}
