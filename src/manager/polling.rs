//! Bounded polling for an asynchronous verdict.

use crate::core::{ScanError, ScanResponse};

use std::future::Future;
use std::time::Duration;

/// Default number of poll queries before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 20;

/// Default delay between poll queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long and how often to poll after an upload.
///
/// The defaults poll at a fixed interval. A multiplier above `1.0` turns
/// this into exponential backoff capped at `max_interval`.
#[derive(Debug, Clone)]
pub struct PollingPolicy {
    /// Maximum number of query calls.
    pub max_retries: u32,

    /// Delay after the first pending reply.
    pub interval: Duration,

    /// Growth factor applied to the delay after each pending reply.
    pub backoff_multiplier: f64,

    /// Upper bound on any single delay.
    pub max_interval: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            interval: DEFAULT_POLL_INTERVAL,
            backoff_multiplier: 1.0,
            max_interval: Duration::from_secs(60),
        }
    }
}

impl PollingPolicy {
    /// Creates a policy with the default fixed interval and ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of query calls. At least one call is made.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Sets the base delay between queries.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_interval(mut self, max: Duration) -> Self {
        self.max_interval = max;
        self
    }

    /// Delay to wait after the `pending`-th pending reply (1-indexed).
    pub fn delay_after(&self, pending: u32) -> Duration {
        if pending == 0 {
            return Duration::ZERO;
        }

        let base = self.interval.as_millis() as f64
            * self.backoff_multiplier.powi(pending as i32 - 1);
        let capped = base.min(self.max_interval.as_millis() as f64);

        Duration::from_millis(capped as u64)
    }

    /// Returns whether `pending` pending replies have used up the budget.
    pub fn is_exhausted(&self, pending: u32) -> bool {
        pending >= self.max_retries
    }
}

/// The response polling stopped on.
#[derive(Debug, Clone)]
pub struct PollResult {
    /// The last response received.
    pub response: ScanResponse,

    /// Number of query calls made.
    pub attempts: u32,

    /// `true` when polling stopped at the ceiling with the verdict still
    /// pending. This is not an error; the `NOT_FOUND` response is returned
    /// as the result.
    pub exhausted: bool,
}

/// Calls `query` until it returns something other than `NOT_FOUND`, or
/// until the policy's ceiling is reached.
///
/// Errors from `query` are returned immediately; only pending verdicts are
/// retried.
pub async fn poll_for_verdict<F, Fut>(
    policy: &PollingPolicy,
    mut query: F,
) -> Result<PollResult, ScanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ScanResponse, ScanError>>,
{
    let mut pending = 0;
    loop {
        let response = query().await?;

        if !response.label().is_pending() {
            return Ok(PollResult {
                response,
                attempts: pending + 1,
                exhausted: false,
            });
        }

        pending += 1;
        if policy.is_exhausted(pending) {
            tracing::warn!(
                attempts = pending,
                "Reached poll ceiling, verdict still pending"
            );
            return Ok(PollResult {
                response,
                attempts: pending,
                exhausted: true,
            });
        }

        let delay = policy.delay_after(pending);
        tracing::debug!(
            attempt = pending,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            "Verdict still pending"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StatusLabel;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy() -> PollingPolicy {
        PollingPolicy::new().with_interval(Duration::ZERO)
    }

    fn pending() -> ScanResponse {
        ScanResponse::from_parts(StatusLabel::NotFound, None)
    }

    #[test]
    fn test_default_policy() {
        let policy = PollingPolicy::default();
        assert_eq!(policy.max_retries, 20);
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(15), Duration::from_secs(2));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = PollingPolicy::new()
            .with_interval(Duration::from_secs(1))
            .with_backoff_multiplier(2.0)
            .with_max_interval(Duration::from_secs(5));

        assert_eq!(policy.delay_after(0), Duration::ZERO);
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_retries_clamped() {
        assert_eq!(PollingPolicy::new().with_max_retries(0).max_retries, 1);
    }

    #[tokio::test]
    async fn test_always_pending_stops_at_ceiling() {
        let calls = AtomicU32::new(0);
        let result = poll_for_verdict(&instant_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ScanError>(pending()) }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_MAX_RETRIES);
        assert_eq!(result.attempts, DEFAULT_MAX_RETRIES);
        assert!(result.exhausted);
        assert!(result.response.label().is_pending());
    }

    #[tokio::test]
    async fn test_found_after_k_pending() {
        let k = 7;
        let calls = AtomicU32::new(0);
        let result = poll_for_verdict(&instant_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= k {
                    Ok::<_, ScanError>(pending())
                } else {
                    Ok(ScanResponse::from_parts(StatusLabel::Found, Some("EICAR-Test")))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        assert_eq!(result.attempts, k + 1);
        assert!(!result.exhausted);
        assert_eq!(result.response.signature_name(), Some("EICAR-Test"));
    }

    #[tokio::test]
    async fn test_other_label_is_terminal() {
        let result = poll_for_verdict(&instant_policy(), || async {
            Ok::<_, ScanError>(ScanResponse::from_parts(
                StatusLabel::Other("FILE_TYPE_NOT_SUPPORTED".into()),
                None,
            ))
        })
        .await
        .unwrap();

        assert_eq!(result.attempts, 1);
        assert!(!result.exhausted);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = poll_for_verdict(&instant_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    Ok(pending())
                } else {
                    Err(ScanError::connection_failed("query", "reset"))
                }
            }
        })
        .await;

        assert!(matches!(result, Err(ScanError::ConnectionFailed { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
