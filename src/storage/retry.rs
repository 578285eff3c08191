//! Retrying store decorator
//!
//! Wraps any [`LedgerStore`] so that every individual call gets a timeout and
//! is retried with exponential backoff on transient failure. Whole service
//! operations are never retried here; a failure that survives the retries is
//! returned to the caller.

use std::future::Future;

use async_trait::async_trait;
use tracing::warn;

use crate::config::{LedgerSettings, RetryPolicy};
use crate::error::StoreError;
use crate::models::GroupId;

use super::{LedgerStore, Record};

pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: LedgerStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let outcome = match tokio::time::timeout(self.policy.call_timeout(), call()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(self.policy.call_timeout_ms)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    let backoff = self.policy.backoff_for_attempt(attempt);
                    warn!(
                        op,
                        attempt = attempt + 1,
                        max_attempts,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient store failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<S: LedgerStore> LedgerStore for RetryingStore<S> {
    fn store_id(&self) -> &str {
        self.inner.store_id()
    }

    async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        self.with_retry("list", || self.inner.list::<T>()).await
    }

    async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.with_retry("get", || self.inner.get::<T>(id)).await
    }

    async fn create<T: Record>(&self, record: T) -> Result<T, StoreError> {
        self.with_retry("create", || self.inner.create(record.clone()))
            .await
    }

    async fn update<T: Record>(&self, id: &str, record: T) -> Result<Option<T>, StoreError> {
        self.with_retry("update", || self.inner.update(id, record.clone()))
            .await
    }

    async fn delete<T: Record>(&self, id: &str) -> Result<bool, StoreError> {
        self.with_retry("delete", || self.inner.delete::<T>(id)).await
    }

    async fn read_settings(&self) -> Result<LedgerSettings, StoreError> {
        self.with_retry("read_settings", || self.inner.read_settings())
            .await
    }

    async fn write_settings(&self, settings: LedgerSettings) -> Result<(), StoreError> {
        self.with_retry("write_settings", || {
            self.inner.write_settings(settings.clone())
        })
        .await
    }

    async fn archive_group(&self, id: GroupId) -> Result<bool, StoreError> {
        self.with_retry("archive_group", || self.inner.archive_group(id))
            .await
    }
}
