//! Per-group locking and cooperative cancellation
//!
//! Balance recomputation and restore both rewrite a group's derived edges
//! with several store calls. [`GroupLocks`] serializes those writers per
//! group; operations on different groups proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, OwnedMutexGuard};

use crate::error::{SplitError, SplitResult};
use crate::models::GroupId;

/// Registry of one async mutex per group, created on first use
#[derive(Debug, Clone, Default)]
pub struct GroupLocks {
    locks: Arc<Mutex<HashMap<GroupId, Arc<Mutex<()>>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn handle(&self, group: GroupId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(&group) {
            return lock.clone();
        }

        // Guards and waiters hold a clone; a lone entry is idle
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(group).or_default().clone()
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Wait for exclusive access to `group`
    pub async fn lock(&self, group: GroupId) -> OwnedMutexGuard<()> {
        self.handle(group).await.lock_owned().await
    }

    /// Lock several groups at once
    ///
    /// Locks are always taken in ascending id order so two callers with
    /// overlapping sets cannot deadlock.
    pub async fn lock_many<I>(&self, groups: I) -> Vec<OwnedMutexGuard<()>>
    where
        I: IntoIterator<Item = GroupId>,
    {
        let mut ids: Vec<GroupId> = groups.into_iter().collect();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.lock(id).await);
        }
        guards
    }
}

/// Sending side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Checked by long-running operations between steps
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// `Err(Cancelled)` once the handle has fired
    pub fn check(&self) -> SplitResult<()> {
        if self.is_cancelled() {
            Err(SplitError::Cancelled)
        } else {
            Ok(())
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_group_is_exclusive() {
        let locks = GroupLocks::new();
        let group = GroupId::new();

        let guard = locks.lock(group).await;
        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.lock(group).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = GroupLocks::new();
        for _ in 0..10 {
            let _guard = locks.lock(GroupId::new()).await;
        }
        assert_eq!(locks.tracked().await, 1);

        let held = GroupId::new();
        let guard = locks.lock(held).await;
        let _other = locks.lock(GroupId::new()).await;
        assert_eq!(locks.tracked().await, 2);

        // The held group keeps its mutex, so it still excludes
        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.lock(held).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_groups_do_not_block() {
        let locks = GroupLocks::new();
        let _a = locks.lock(GroupId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(GroupId::new())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_lock_many_dedups() {
        let locks = GroupLocks::new();
        let a = GroupId::new();
        let b = GroupId::new();
        let guards = locks.lock_many([b, a, b]).await;
        assert_eq!(guards.len(), 2);
    }

    #[test]
    fn test_cancel_token() {
        let (handle, token) = cancel_pair();
        assert!(token.check().is_ok());

        let other = handle.token();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(other.check(), Err(SplitError::Cancelled)));
        assert!(!CancelToken::never().is_cancelled());
    }
}
