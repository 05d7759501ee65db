// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Retry decorator for attribute store clients.
//
// Wraps any `AttributeStore` and re-issues operations that fail with a
// retryable error (throttling or a server-side failure). Client errors
// pass through untouched on the first attempt.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_format::AttributeMap;

use crate::error::ClientError;
use crate::store::{AttributeStore, ItemPage};

/// Backoff configuration for [`RetryStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of re-attempts after the initial call.
    pub retries: u32,
    /// Delay before the first re-attempt.
    pub min_delay: Duration,
    /// Upper bound on the delay between re-attempts.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each re-attempt.
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            factor: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep before re-attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.min_delay.as_secs_f64() * self.factor.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(scaled).min(self.max_delay)
    }
}

/// Decorator adding retry with backoff to any [`AttributeStore`].
///
/// # Example
///
/// ```rust
/// use strata_client::{AttributeStore, MemoryStore, RetryPolicy, RetryStore};
///
/// # tokio_test::block_on(async {
/// let store = RetryStore::new(MemoryStore::new(), RetryPolicy::default());
/// store.create_domain("inventory").await.unwrap();
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct RetryStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: AttributeStore> RetryStore<S> {
    /// Wrap `inner` with the given retry `policy`.
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Access the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, ClientError>> + Send,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.policy.retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    debug!(op, attempt, ?delay, error = %err, "retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<S: AttributeStore> AttributeStore for RetryStore<S> {
    async fn create_domain(&self, domain: &str) -> Result<(), ClientError> {
        self.with_retry("create_domain", || self.inner.create_domain(domain))
            .await
    }

    async fn delete_domain(&self, domain: &str) -> Result<(), ClientError> {
        self.with_retry("delete_domain", || self.inner.delete_domain(domain))
            .await
    }

    async fn get_attributes(
        &self,
        domain: &str,
        id: &str,
        names: Option<&[String]>,
    ) -> Result<Option<AttributeMap>, ClientError> {
        self.with_retry("get_attributes", || {
            self.inner.get_attributes(domain, id, names)
        })
        .await
    }

    async fn put_attributes(
        &self,
        domain: &str,
        id: &str,
        attrs: &AttributeMap,
    ) -> Result<(), ClientError> {
        self.with_retry("put_attributes", || {
            self.inner.put_attributes(domain, id, attrs)
        })
        .await
    }

    async fn delete_attributes(
        &self,
        domain: &str,
        id: &str,
        names: Option<&[String]>,
    ) -> Result<(), ClientError> {
        self.with_retry("delete_attributes", || {
            self.inner.delete_attributes(domain, id, names)
        })
        .await
    }

    async fn select(&self, query: &str, next: Option<&str>) -> Result<ItemPage, ClientError> {
        self.with_retry("select", || self.inner.select(query, next))
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with the scripted error, then
    /// succeeds.
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
        error: fn() -> ClientError,
    }

    impl FlakyStore {
        fn new(failures: u32, error: fn() -> ClientError) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                error,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AttributeStore for FlakyStore {
        async fn create_domain(&self, _domain: &str) -> Result<(), ClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err((self.error)())
            } else {
                Ok(())
            }
        }

        async fn delete_domain(&self, _domain: &str) -> Result<(), ClientError> {
            unimplemented!()
        }

        async fn get_attributes(
            &self,
            _domain: &str,
            _id: &str,
            _names: Option<&[String]>,
        ) -> Result<Option<AttributeMap>, ClientError> {
            unimplemented!()
        }

        async fn put_attributes(
            &self,
            _domain: &str,
            _id: &str,
            _attrs: &AttributeMap,
        ) -> Result<(), ClientError> {
            unimplemented!()
        }

        async fn delete_attributes(
            &self,
            _domain: &str,
            _id: &str,
            _names: Option<&[String]>,
        ) -> Result<(), ClientError> {
            unimplemented!()
        }

        async fn select(&self, _query: &str, _next: Option<&str>) -> Result<ItemPage, ClientError> {
            unimplemented!()
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn instant_policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            factor: 1.0,
        }
    }

    fn throttled() -> ClientError {
        ClientError::Throttled("slow down".to_string())
    }

    fn bad_request() -> ClientError {
        ClientError::Service {
            status: 400,
            message: "bad request".to_string(),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let store = RetryStore::new(FlakyStore::new(2, throttled), instant_policy(3));
        store.create_domain("d").await.unwrap();
        assert_eq!(store.inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let store = RetryStore::new(FlakyStore::new(10, throttled), instant_policy(3));
        let err = store.create_domain("d").await.unwrap_err();
        assert!(matches!(err, ClientError::Throttled(_)));
        // Initial attempt plus three retries.
        assert_eq!(store.inner().calls(), 4);
    }

    #[tokio::test]
    async fn test_client_errors_fail_immediately() {
        let store = RetryStore::new(FlakyStore::new(10, bad_request), instant_policy(3));
        let err = store.create_domain("d").await.unwrap_err();
        assert!(matches!(err, ClientError::Service { status: 400, .. }));
        assert_eq!(store.inner().calls(), 1);
    }

    #[test]
    fn test_delay_window() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(100));

        let growing = RetryPolicy {
            factor: 2.0,
            ..RetryPolicy::default()
        };
        assert_eq!(growing.delay_for(1), Duration::from_millis(100));
        assert_eq!(growing.delay_for(2), Duration::from_millis(200));
        // Capped by the window.
        assert_eq!(growing.delay_for(3), Duration::from_millis(250));
    }
}
