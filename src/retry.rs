use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use crate::{Response, Result};

/// Decides, from the outcome of one attempt, whether another attempt is made.
pub type ShouldRetry = Arc<dyn Fn(&Result<Response>) -> bool + Send + Sync>;

/// Default rule: retry on any error and on any status other than `200 OK`.
pub fn default_should_retry(outcome: &Result<Response>) -> bool {
    match outcome {
        Ok(response) => response.status() != StatusCode::OK,
        Err(_) => true,
    }
}

/// Attempt bounds for one logical call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct RetryPlan {
    pub retry_times: usize,
    pub backoff: Duration,
}

impl RetryPlan {
    pub fn new(retry_times: usize, backoff: Duration) -> Self {
        Self {
            retry_times,
            backoff,
        }
    }

    pub fn total_attempts(&self) -> usize {
        self.retry_times.saturating_add(1)
    }

    /// Delay before attempt `attempt` (zero-based); exponential like `backoff * 2^(n-1)`.
    fn delay_before(&self, attempt: usize) -> Duration {
        if attempt == 0 || self.backoff.is_zero() {
            return Duration::ZERO;
        }
        let exp = (attempt - 1).min(16) as u32;
        self.backoff.saturating_mul(1u32 << exp)
    }
}

enum State<T> {
    Attempt { attempt: usize },
    Evaluate { attempt: usize, outcome: T },
    Stop { outcome: T },
}

/// Drives the attempt loop: `Attempt -> Evaluate -> (Attempt | Stop)`.
///
/// `send` performs attempt `n` (zero-based). When retries are configured the
/// predicate sees every outcome, the last one included; a `false` answer
/// stops the loop even if attempts remain. The outcome of the last attempt
/// is returned.
pub(crate) async fn drive<T, S, Fut, P>(plan: RetryPlan, should_retry: P, mut send: S) -> T
where
    S: FnMut(usize) -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let total = plan.total_attempts();
    let mut state = State::Attempt { attempt: 0 };

    loop {
        state = match state {
            State::Attempt { attempt } => {
                let delay = plan.delay_before(attempt);
                if !delay.is_zero() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("retrying request after {} ms", delay.as_millis());

                    tokio::time::sleep(delay).await;
                }

                #[cfg(feature = "tracing")]
                tracing::debug!(attempt = attempt + 1, total, "sending request");

                let outcome = send(attempt).await;
                State::Evaluate { attempt, outcome }
            }
            State::Evaluate { attempt, outcome } => {
                if plan.retry_times == 0 {
                    State::Stop { outcome }
                } else if !should_retry(&outcome) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = attempt + 1, "retry predicate declined");

                    State::Stop { outcome }
                } else if attempt + 1 >= total {
                    State::Stop { outcome }
                } else {
                    State::Attempt {
                        attempt: attempt + 1,
                    }
                }
            }
            State::Stop { outcome } => return outcome,
        };
    }
}
