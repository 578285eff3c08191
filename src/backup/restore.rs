//! Restore reconciler
//!
//! Brings a snapshot back into the store. Two modes:
//!
//! - `replace` upserts every snapshot record by primary key.
//! - `merge` keeps the most recently modified copy of participants, groups,
//!   and expenses, and inserts settlements, comments, and notifications only
//!   when they are missing locally.
//!
//! Balance edges are never imported. Once the history is in place every
//! affected group is recomputed from it. Each step is idempotent, so an
//! apply that failed halfway can simply be run again.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::concurrency::CancelToken;
use crate::error::{SplitError, SplitResult};
use crate::models::{
    Comment, Expense, Group, GroupId, Notification, Participant, Recency, Settlement,
};
use crate::services::BalanceService;
use crate::storage::{Ledger, LedgerStore, Record};

use super::envelope::{checksum_of_value, EntityCounts, Envelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    Replace,
    Merge,
}

impl fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

impl FromStr for RestoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            other => Err(format!("unknown restore mode '{}' (use replace or merge)", other)),
        }
    }
}

/// Outcome of [`Reconciler::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn summary(&self) -> String {
        if self.valid {
            "Snapshot is valid".to_string()
        } else {
            format!("Snapshot is invalid: {}", self.errors.join("; "))
        }
    }
}

/// A record present both locally and in the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    pub entity: &'static str,
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct RestorePreview {
    pub mode: RestoreMode,
    pub counts: EntityCounts,
    /// Number of shared ids; only computed for merge
    pub conflicts: usize,
    pub conflicting: Vec<ConflictInfo>,
}

/// Per-collection tally of an apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct RestoreSummary {
    pub mode: RestoreMode,
    pub snapshot_id: String,
    /// Keyed by collection name
    pub outcomes: BTreeMap<&'static str, Outcome>,
    pub settings_changed: bool,
    pub groups_recomputed: Vec<GroupId>,
}

impl RestoreSummary {
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .outcomes
            .iter()
            .filter(|(_, o)| o.inserted + o.updated > 0)
            .map(|(name, o)| format!("{} +{} ~{}", name, o.inserted, o.updated))
            .collect();
        let body = if parts.is_empty() {
            "no records changed".to_string()
        } else {
            parts.join(", ")
        };
        format!(
            "{}: {}; {} groups recomputed",
            self.mode,
            body,
            self.groups_recomputed.len()
        )
    }
}

pub struct Reconciler<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: LedgerStore> Reconciler<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    /// Check structure and checksum of raw snapshot bytes
    pub fn validate(&self, bytes: &[u8]) -> ValidationReport {
        let errors = validation_errors(bytes);
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Validate and parse; an invalid snapshot is an `Integrity` error
    pub fn parse(&self, bytes: &[u8]) -> SplitResult<Envelope> {
        let errors = validation_errors(bytes);
        if !errors.is_empty() {
            return Err(SplitError::Integrity(errors));
        }
        Envelope::from_bytes(bytes)
    }

    /// Describe what `apply` would touch, without writing anything
    pub async fn preview(&self, snapshot: &Envelope, mode: RestoreMode) -> SplitResult<RestorePreview> {
        let conflicting = match mode {
            RestoreMode::Replace => Vec::new(),
            RestoreMode::Merge => {
                let data = &snapshot.data;
                let mut shared = Vec::new();
                shared.extend(self.shared_ids(&data.participants).await?);
                shared.extend(self.shared_ids(&data.groups).await?);
                shared.extend(self.shared_ids(&data.expenses).await?);
                shared.extend(self.shared_ids(&data.settlements).await?);
                shared.extend(self.shared_ids(&data.comments).await?);
                shared.extend(self.shared_ids(&data.notifications).await?);
                shared
            }
        };

        Ok(RestorePreview {
            mode,
            counts: snapshot.data.counts(),
            conflicts: conflicting.len(),
            conflicting,
        })
    }

    async fn shared_ids<T: Record>(&self, incoming: &[T]) -> SplitResult<Vec<ConflictInfo>> {
        let local: HashSet<String> = self
            .ledger
            .store()
            .list::<T>()
            .await?
            .iter()
            .map(Record::key)
            .collect();

        Ok(incoming
            .iter()
            .map(Record::key)
            .filter(|k| local.contains(k))
            .map(|id| ConflictInfo {
                entity: T::ENTITY,
                id,
            })
            .collect())
    }

    /// Write a verified snapshot into the store
    ///
    /// Holds the locks of every affected group until balances are rebuilt.
    pub async fn apply(
        &self,
        snapshot: &Envelope,
        mode: RestoreMode,
        cancel: &CancelToken,
    ) -> SplitResult<RestoreSummary> {
        if !snapshot.verify() {
            return Err(SplitError::Integrity(vec![
                "Checksum validation failed".to_string()
            ]));
        }

        let affected = affected_groups(snapshot);
        let _guards = self.ledger.locks().lock_many(affected.iter().copied()).await;

        let data = &snapshot.data;
        let mut outcomes = BTreeMap::new();

        cancel.check()?;
        outcomes.insert(Participant::COLLECTION, self.import_mutable(&data.participants, mode).await?);
        cancel.check()?;
        outcomes.insert(Group::COLLECTION, self.import_mutable(&data.groups, mode).await?);
        cancel.check()?;
        outcomes.insert(Expense::COLLECTION, self.import_mutable(&data.expenses, mode).await?);
        cancel.check()?;
        outcomes.insert(Settlement::COLLECTION, self.import_append_only(&data.settlements, mode).await?);
        cancel.check()?;
        outcomes.insert(Comment::COLLECTION, self.import_append_only(&data.comments, mode).await?);
        cancel.check()?;
        outcomes.insert(
            Notification::COLLECTION,
            self.import_append_only(&data.notifications, mode).await?,
        );

        cancel.check()?;
        let settings_changed = self.import_settings(snapshot, mode).await?;

        let balances = BalanceService::new(self.ledger);
        let mut groups_recomputed = Vec::new();
        for group_id in affected {
            cancel.check()?;
            if self.ledger.store().get::<Group>(&group_id.key()).await?.is_none() {
                warn!(group_id = %group_id, "snapshot references a group that does not exist");
                continue;
            }
            balances.recompute_locked(group_id).await?;
            groups_recomputed.push(group_id);
        }

        let summary = RestoreSummary {
            mode,
            snapshot_id: snapshot.metadata.id.to_string(),
            outcomes,
            settings_changed,
            groups_recomputed,
        };
        info!(snapshot_id = %summary.snapshot_id, mode = %mode, "applied snapshot");
        self.ledger
            .log_restore(summary.snapshot_id.clone(), summary.summary())?;

        Ok(summary)
    }

    /// Upsert by key; in merge mode the more recent copy wins and ties keep
    /// the local record
    async fn import_mutable<T: Record + Recency>(
        &self,
        records: &[T],
        mode: RestoreMode,
    ) -> SplitResult<Outcome> {
        let store = self.ledger.store();
        let mut outcome = Outcome::default();

        for record in records {
            let key = record.key();
            match store.get::<T>(&key).await? {
                None => {
                    store.create(record.clone()).await?;
                    outcome.inserted += 1;
                }
                Some(local) => {
                    let take = match mode {
                        RestoreMode::Replace => true,
                        RestoreMode::Merge => record.recency() > local.recency(),
                    };
                    if take {
                        store.update(&key, record.clone()).await?;
                        outcome.updated += 1;
                    } else {
                        outcome.skipped += 1;
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// History records are never edited; merge only fills gaps
    async fn import_append_only<T: Record>(
        &self,
        records: &[T],
        mode: RestoreMode,
    ) -> SplitResult<Outcome> {
        let store = self.ledger.store();
        let mut outcome = Outcome::default();

        for record in records {
            let key = record.key();
            let exists = store.get::<T>(&key).await?.is_some();
            match (exists, mode) {
                (false, _) => {
                    store.create(record.clone()).await?;
                    outcome.inserted += 1;
                }
                (true, RestoreMode::Replace) => {
                    store.update(&key, record.clone()).await?;
                    outcome.updated += 1;
                }
                (true, RestoreMode::Merge) => outcome.skipped += 1,
            }
        }
        Ok(outcome)
    }

    async fn import_settings(&self, snapshot: &Envelope, mode: RestoreMode) -> SplitResult<bool> {
        let store = self.ledger.store();
        let local = store.read_settings().await?;

        let next = match mode {
            RestoreMode::Replace => snapshot.settings.clone(),
            RestoreMode::Merge => {
                let mut merged = local.clone();
                merged.merge_missing(&snapshot.settings);
                merged
            }
        };

        if next == local {
            return Ok(false);
        }
        store.write_settings(next).await?;
        Ok(true)
    }
}

/// Groups in the snapshot plus groups its history refers to
fn affected_groups(snapshot: &Envelope) -> BTreeSet<GroupId> {
    let data = &snapshot.data;
    data.groups
        .iter()
        .map(|g| g.id)
        .chain(data.expenses.iter().map(|e| e.group_id))
        .chain(data.settlements.iter().map(|s| s.group_id))
        .collect()
}

const REQUIRED_FIELDS: [&str; 5] = ["format_version", "metadata", "data", "settings", "checksum"];
const CORE_COLLECTIONS: [&str; 4] = ["participants", "groups", "expenses", "settlements"];
const OPTIONAL_COLLECTIONS: [&str; 3] = ["balances", "comments", "notifications"];

fn validation_errors(bytes: &[u8]) -> Vec<String> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => return vec![format!("Snapshot is not valid JSON: {}", e)],
    };
    let Some(root) = value.as_object() else {
        return vec!["Snapshot must be a JSON object".to_string()];
    };

    let mut errors = Vec::new();
    for field in REQUIRED_FIELDS {
        let present = match root.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            errors.push(format!("Missing {}", field));
        }
    }

    if let Some(version) = root.get("format_version").and_then(Value::as_str) {
        if !version.starts_with("1.") {
            errors.push(format!("Unsupported format version {}", version));
        }
    }

    if let Some(data) = root.get("data") {
        for name in CORE_COLLECTIONS {
            if !data.get(name).is_some_and(Value::is_array) {
                errors.push(format!("Invalid {} data", name));
            }
        }
        for name in OPTIONAL_COLLECTIONS {
            if data.get(name).is_some_and(|v| !v.is_array()) {
                errors.push(format!("Invalid {} data", name));
            }
        }
    }

    if let Some(stored) = root.get("checksum").and_then(Value::as_str) {
        if !stored.is_empty() {
            match checksum_of_value(&value) {
                Ok(computed) if computed == stored => {}
                Ok(_) => errors.push("Checksum validation failed".to_string()),
                Err(e) => errors.push(format!("Could not compute checksum: {}", e)),
            }
        }
    }

    // apply re-checks the parsed envelope, so both hashes must agree
    if errors.is_empty() {
        match serde_json::from_value::<Envelope>(value) {
            Ok(envelope) if !envelope.verify() => {
                errors.push("Snapshot does not match its canonical form".to_string())
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("Malformed snapshot record: {}", e)),
        }
    }

    errors
}
