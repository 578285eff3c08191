//! Balance service
//!
//! Owns the derived balance edges. Edges are never patched: every change to
//! a group's history ends in [`BalanceService::recompute`], which rebuilds the
//! whole edge set from the history and swaps it into the store.

use tracing::{debug, info};

use crate::error::SplitResult;
use crate::models::{BalanceEdge, GroupId, ParticipantKey};
use crate::netting::{self, NetPositions};
use crate::storage::{Ledger, LedgerStore};

pub struct BalanceService<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: LedgerStore> BalanceService<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    /// Re-derive and store a group's edges, holding the group lock
    pub async fn recompute(&self, group_id: GroupId) -> SplitResult<Vec<BalanceEdge>> {
        let _guard = self.ledger.locks().lock(group_id).await;
        self.recompute_locked(group_id).await
    }

    /// Same as [`recompute`](Self::recompute) for callers already holding the
    /// group lock
    pub async fn recompute_locked(&self, group_id: GroupId) -> SplitResult<Vec<BalanceEdge>> {
        let group = self.ledger.require_group(group_id).await?;
        let (expenses, settlements) = self.ledger.group_history(group_id).await?;

        let edges = netting::compute_edges(group_id, &group.currency, &expenses, &settlements);
        self.replace_edges(group_id, &edges).await?;

        info!(
            group_id = %group_id,
            expenses = expenses.len(),
            settlements = settlements.len(),
            edges = edges.len(),
            "recomputed balances"
        );
        Ok(edges)
    }

    /// Swap the stored edge set for `edges`, leaving identical edges untouched
    async fn replace_edges(&self, group_id: GroupId, edges: &[BalanceEdge]) -> SplitResult<()> {
        let store = self.ledger.store();
        let stored = self.edges_for_group(group_id).await?;

        let mut removed = 0;
        for edge in &stored {
            if !edges.iter().any(|e| e.key() == edge.key()) {
                store.delete::<BalanceEdge>(&edge.key()).await?;
                removed += 1;
            }
        }

        let mut written = 0;
        for edge in edges {
            if !stored.contains(edge) {
                store.create(edge.clone()).await?;
                written += 1;
            }
        }

        debug!(group_id = %group_id, removed, written, "replaced edges");
        Ok(())
    }

    /// Stored edges of one group, ordered by debtor then creditor
    pub async fn edges_for_group(&self, group_id: GroupId) -> SplitResult<Vec<BalanceEdge>> {
        let mut edges: Vec<BalanceEdge> = self.ledger.store().list().await?;
        edges.retain(|e| e.group_id == group_id);
        edges.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        Ok(edges)
    }

    /// Stored edges across all groups that involve `participant`
    pub async fn edges_for_participant(
        &self,
        participant: &ParticipantKey,
    ) -> SplitResult<Vec<BalanceEdge>> {
        let mut edges: Vec<BalanceEdge> = self.ledger.store().list().await?;
        edges.retain(|e| e.involves(participant));
        Ok(edges)
    }

    /// Net position of every participant in a group's history
    pub async fn net_positions(&self, group_id: GroupId) -> SplitResult<NetPositions> {
        self.ledger.require_group(group_id).await?;
        let (expenses, settlements) = self.ledger.group_history(group_id).await?;
        Ok(netting::net_positions(&expenses, &settlements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LedgerSettings, SplitItPaths};
    use crate::error::StoreError;
    use crate::models::{Expense, Group, Settlement, Split};
    use crate::storage::{JsonStore, Record};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tempfile::TempDir;

    /// Counts writes and can make the settlement history unreadable
    struct WatchedStore {
        inner: JsonStore,
        settlements_unreadable: AtomicBool,
        writes: AtomicU32,
    }

    #[async_trait]
    impl LedgerStore for WatchedStore {
        fn store_id(&self) -> &str {
            self.inner.store_id()
        }

        async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
            if T::COLLECTION == Settlement::COLLECTION
                && self.settlements_unreadable.load(Ordering::SeqCst)
            {
                return Err(StoreError::Corrupt {
                    kind: Settlement::COLLECTION,
                    reason: "truncated file".into(),
                });
            }
            self.inner.list().await
        }

        async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
            self.inner.get(id).await
        }

        async fn create<T: Record>(&self, record: T) -> Result<T, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.create(record).await
        }

        async fn update<T: Record>(&self, id: &str, record: T) -> Result<Option<T>, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.update(id, record).await
        }

        async fn delete<T: Record>(&self, id: &str) -> Result<bool, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete::<T>(id).await
        }

        async fn read_settings(&self) -> Result<LedgerSettings, StoreError> {
            self.inner.read_settings().await
        }

        async fn write_settings(&self, settings: LedgerSettings) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write_settings(settings).await
        }
    }

    async fn create_watched_ledger() -> (Ledger<WatchedStore>, Group, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SplitItPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = WatchedStore {
            inner: JsonStore::open(paths).await.unwrap(),
            settlements_unreadable: AtomicBool::new(false),
            writes: AtomicU32::new(0),
        };
        let ledger = Ledger::new(store);
        let group = Group::new("Trip", "USD", key("a"), vec![key("b"), key("c")]);
        ledger.store().create(group.clone()).await.unwrap();
        (ledger, group, temp_dir)
    }

    fn key(s: &str) -> ParticipantKey {
        ParticipantKey::new(s)
    }

    async fn create_test_ledger() -> (Ledger<JsonStore>, Group, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SplitItPaths::with_base_dir(temp_dir.path().to_path_buf());
        let ledger = Ledger::new(JsonStore::open(paths).await.unwrap());
        let group = Group::new("Trip", "USD", key("a"), vec![key("b"), key("c")]);
        ledger.store().create(group.clone()).await.unwrap();
        (ledger, group, temp_dir)
    }

    fn dinner(group: &Group) -> Expense {
        Expense::new(
            group.id,
            key("a"),
            90.0,
            "USD",
            vec![
                Split::new(key("a"), 30.0),
                Split::new(key("b"), 30.0),
                Split::new(key("c"), 30.0),
            ],
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_recompute_stores_edges() {
        let (ledger, group, _temp) = create_test_ledger().await;
        ledger.store().create(dinner(&group)).await.unwrap();

        let service = BalanceService::new(&ledger);
        let edges = service.recompute(group.id).await.unwrap();
        assert_eq!(edges.len(), 2);

        let stored = service.edges_for_group(group.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|e| e.to == key("a") && e.amount == 30.0));
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let (ledger, group, _temp) = create_test_ledger().await;
        ledger.store().create(dinner(&group)).await.unwrap();

        let service = BalanceService::new(&ledger);
        let first = service.recompute(group.id).await.unwrap();
        let second = service.recompute(group.id).await.unwrap();

        assert_eq!(first.len(), second.len());
        assert!(first.iter().zip(&second).all(|(a, b)| a.same_debt(b)));
        assert_eq!(service.edges_for_group(group.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recompute_drops_stale_edges() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let expense = dinner(&group);
        ledger.store().create(expense.clone()).await.unwrap();

        let service = BalanceService::new(&ledger);
        service.recompute(group.id).await.unwrap();

        ledger
            .store()
            .delete::<Expense>(&expense.id.key())
            .await
            .unwrap();
        assert!(service.recompute(group.id).await.unwrap().is_empty());
        assert!(service.edges_for_group(group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edges_for_participant_spans_groups() {
        let (ledger, group, _temp) = create_test_ledger().await;
        let other = Group::new("Flat", "USD", key("c"), vec![key("d")]);
        ledger.store().create(other.clone()).await.unwrap();

        ledger.store().create(dinner(&group)).await.unwrap();
        let rent = Expense::new(
            other.id,
            key("d"),
            10.0,
            "USD",
            vec![Split::new(key("c"), 10.0)],
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        );
        ledger.store().create(rent).await.unwrap();

        let service = BalanceService::new(&ledger);
        service.recompute(group.id).await.unwrap();
        service.recompute(other.id).await.unwrap();

        let edges = service.edges_for_participant(&key("c")).await.unwrap();
        assert_eq!(edges.len(), 2);
        assert!(service.edges_for_participant(&key("z")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recompute_unknown_group() {
        let (ledger, _group, _temp) = create_test_ledger().await;
        let err = BalanceService::new(&ledger)
            .recompute(GroupId::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unchanged_recompute_writes_nothing() {
        let (ledger, group, _temp) = create_watched_ledger().await;
        ledger.store().create(dinner(&group)).await.unwrap();

        let service = BalanceService::new(&ledger);
        service.recompute(group.id).await.unwrap();
        let before: Vec<BalanceEdge> = ledger.store().list().await.unwrap();
        let writes = ledger.store().writes.load(Ordering::SeqCst);

        service.recompute(group.id).await.unwrap();
        let after: Vec<BalanceEdge> = ledger.store().list().await.unwrap();

        assert_eq!(before, after);
        assert_eq!(ledger.store().writes.load(Ordering::SeqCst), writes);
    }

    #[tokio::test]
    async fn test_unreadable_history_aborts_before_writing() {
        let (ledger, group, _temp) = create_watched_ledger().await;
        ledger.store().create(dinner(&group)).await.unwrap();

        let service = BalanceService::new(&ledger);
        service.recompute(group.id).await.unwrap();
        let seeded = service.edges_for_group(group.id).await.unwrap();
        assert_eq!(seeded.len(), 2);

        let mut lunch = dinner(&group);
        lunch.id = crate::models::ExpenseId::new();
        ledger.store().create(lunch).await.unwrap();

        ledger
            .store()
            .settlements_unreadable
            .store(true, Ordering::SeqCst);
        let writes = ledger.store().writes.load(Ordering::SeqCst);

        let err = service.recompute(group.id).await.unwrap_err();
        assert!(matches!(err, crate::error::SplitError::Store(_)));
        assert_eq!(ledger.store().writes.load(Ordering::SeqCst), writes);
        assert_eq!(service.edges_for_group(group.id).await.unwrap(), seeded);
    }
}
