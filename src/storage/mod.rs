//! Storage layer for SplitIt
//!
//! Defines the ledger store contract consumed by the services, a JSON-file
//! implementation of it, and a decorator adding retries and timeouts.
//!
//! The store is a plain keyed repository: per-entity CRUD with full-scan
//! listing and no multi-record transactions. Anything that must stay
//! consistent across records (the derived balance edges) is guarded by the
//! per-group locks held in [`Ledger`].

pub mod file_io;
pub mod json_store;
pub mod records;
pub mod retry;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::concurrency::GroupLocks;
use crate::config::LedgerSettings;
use crate::error::{SplitError, SplitResult, StoreError};
use crate::models::{Expense, Group, GroupId, Settlement};

pub use json_store::JsonStore;
pub use retry::RetryingStore;

/// An entity that lives in its own store collection
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name; also the JSON file stem
    const COLLECTION: &'static str;
    /// Human-readable entity name for errors and logs
    const ENTITY: &'static str;

    /// Primary key within the collection
    fn key(&self) -> String;
}

/// Contract of the external record store
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Stable identifier of this store, recorded in snapshots
    fn store_id(&self) -> &str;

    async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError>;

    async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError>;

    /// Insert a record under its own key, replacing any record with that key
    async fn create<T: Record>(&self, record: T) -> Result<T, StoreError>;

    /// Replace an existing record; `None` if `id` is unknown
    async fn update<T: Record>(&self, id: &str, record: T) -> Result<Option<T>, StoreError>;

    /// Remove a record; false if it did not exist
    async fn delete<T: Record>(&self, id: &str) -> Result<bool, StoreError>;

    async fn read_settings(&self) -> Result<LedgerSettings, StoreError>;

    async fn write_settings(&self, settings: LedgerSettings) -> Result<(), StoreError>;

    /// Soft-delete a group; false if it does not exist
    async fn archive_group(&self, id: GroupId) -> Result<bool, StoreError> {
        let key = id.key();
        match self.get::<Group>(&key).await? {
            Some(mut group) => {
                group.archived = true;
                group.touch();
                Ok(self.update(&key, group).await?.is_some())
            }
            None => Ok(false),
        }
    }
}

/// Store handle shared by all services
///
/// Bundles the store with the per-group locks that serialize recomputation
/// and the optional audit log.
pub struct Ledger<S> {
    store: S,
    locks: GroupLocks,
    audit: Option<AuditLogger>,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: GroupLocks::new(),
            audit: None,
        }
    }

    /// Record every mutation in an audit log
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &GroupLocks {
        &self.locks
    }

    pub fn audit(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Fetch a group or fail with `NotFound`
    pub async fn require_group(&self, id: GroupId) -> SplitResult<Group> {
        self.store
            .get::<Group>(&id.key())
            .await?
            .ok_or_else(|| SplitError::group_not_found(id.to_string()))
    }

    /// Read a group's full expense and settlement history
    ///
    /// Either both collections are read completely or an error is returned.
    pub async fn group_history(&self, id: GroupId) -> SplitResult<(Vec<Expense>, Vec<Settlement>)> {
        let mut expenses: Vec<Expense> = self.store.list().await?;
        expenses.retain(|e| e.group_id == id);

        let mut settlements: Vec<Settlement> = self.store.list().await?;
        settlements.retain(|s| s.group_id == id);

        Ok((expenses, settlements))
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> SplitResult<()> {
        self.log(|| AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> SplitResult<()> {
        self.log(|| AuditEntry::update(entity_type, entity_id, entity_name, before, after))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> SplitResult<()> {
        self.log(|| AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_restore(&self, snapshot_id: impl Into<String>, summary: String) -> SplitResult<()> {
        self.log(|| AuditEntry::restore(snapshot_id, summary))
    }

    fn log(&self, entry: impl FnOnce() -> AuditEntry) -> SplitResult<()> {
        match &self.audit {
            Some(logger) => logger.log(&entry()),
            None => Ok(()),
        }
    }
}
