//! Bounded oracle calls: per-attempt timeout plus at most one retry.

use backon::{ConstantBuilder, Retryable};
use std::future::Future;

use crate::config::OraclePolicy;
use crate::error::{ValtheraError, ValtheraResult};

/// Run `call` under `policy`.
///
/// Each attempt is cut off at the policy timeout. Transient failures
/// (timeouts, malformed output, provider errors) are retried; anything
/// else returns immediately. The last error is returned once the budget is
/// spent.
pub(crate) async fn call_with_policy<T, F, Fut>(
    oracle: &'static str,
    policy: &OraclePolicy,
    mut call: F,
) -> ValtheraResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ValtheraResult<T>>,
{
    let timeout = policy.timeout();
    let timeout_ms = policy.timeout_ms;

    let attempt = || {
        let fut = call();
        async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => Err(ValtheraError::OracleTimeout {
                    oracle: oracle.to_string(),
                    timeout_ms,
                }),
            }
        }
    };

    attempt
        .retry(
            ConstantBuilder::default()
                .with_delay(policy.delay())
                .with_max_times(policy.effective_retries()),
        )
        .when(|e: &ValtheraError| e.is_transient())
        .notify(|err, dur| {
            tracing::warn!(
                oracle,
                "Oracle call failed, retrying in {:?}: {}",
                dur,
                err
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast_policy() -> OraclePolicy {
        OraclePolicy::with_timeout(Duration::from_millis(20)).retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_transient_error_retried_once() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: ValtheraResult<()> = call_with_policy("test", &fast_policy(), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ValtheraError::oracle_parse("not json"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_budget_clamped() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = fast_policy().retries(10);
        let _: ValtheraResult<()> = call_with_policy("test", &policy, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ValtheraError::llm("boom"))
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: ValtheraResult<()> = call_with_policy("test", &fast_policy(), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ValtheraError::Internal("bad".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ValtheraError::Internal(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_oracle_timeout() {
        let result: ValtheraResult<u8> = call_with_policy("slow", &fast_policy(), || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;

        match result {
            Err(ValtheraError::OracleTimeout { oracle, timeout_ms }) => {
                assert_eq!(oracle, "slow");
                assert_eq!(timeout_ms, 20);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_attempt_succeeds() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result = call_with_policy("test", &fast_policy(), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ValtheraError::oracle_parse("garbled"))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }
}
