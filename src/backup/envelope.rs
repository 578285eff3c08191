//! Snapshot envelope format
//!
//! A snapshot is a single JSON document:
//!
//! - `format_version`: envelope schema version
//! - `metadata`: id, timestamp, owner, app version, source store, type
//! - `data`: every entity collection, each sorted by primary key
//! - `settings`: preference maps shared through the store
//! - `checksum`: lowercase hex SHA-256 of the canonical form
//!
//! The canonical form is the envelope as a JSON value with `checksum` set to
//! the empty string, written compactly with object keys in sorted order. The
//! digest therefore depends only on the logical content, never on how a file
//! happens to be indented.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::LedgerSettings;
use crate::error::{SplitError, SplitResult};
use crate::models::{
    BalanceEdge, Comment, Expense, Group, Notification, Participant, Settlement, SnapshotId,
};
use crate::storage::Record;

/// Envelope schema version written by this build
pub const FORMAT_VERSION: &str = "1.0.0";

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotType {
    Full,
    Partial,
    Selective,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotMetadata {
    pub id: SnapshotId,
    pub timestamp: DateTime<Utc>,
    /// Participant key of whoever took the snapshot
    pub owner: String,
    pub app_version: String,
    pub source_store_id: String,
    #[serde(rename = "type")]
    pub snapshot_type: SnapshotType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotData {
    pub participants: Vec<Participant>,
    pub groups: Vec<Group>,
    pub expenses: Vec<Expense>,
    pub settlements: Vec<Settlement>,
    /// Carried for completeness; never imported on restore
    pub balances: Vec<BalanceEdge>,
    pub comments: Vec<Comment>,
    pub notifications: Vec<Notification>,
}

impl SnapshotData {
    /// Sort every collection by primary key
    pub fn sort(&mut self) {
        sort_by_key(&mut self.participants);
        sort_by_key(&mut self.groups);
        sort_by_key(&mut self.expenses);
        sort_by_key(&mut self.settlements);
        sort_by_key(&mut self.balances);
        sort_by_key(&mut self.comments);
        sort_by_key(&mut self.notifications);
    }

    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            participants: self.participants.len(),
            groups: self.groups.len(),
            expenses: self.expenses.len(),
            settlements: self.settlements.len(),
            balances: self.balances.len(),
            comments: self.comments.len(),
            notifications: self.notifications.len(),
        }
    }
}

fn sort_by_key<T: Record>(records: &mut [T]) {
    records.sort_by_cached_key(|r| r.key());
}

/// Number of records per entity type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub participants: usize,
    pub groups: usize,
    pub expenses: usize,
    pub settlements: usize,
    pub balances: usize,
    pub comments: usize,
    pub notifications: usize,
}

impl EntityCounts {
    pub fn total(&self) -> usize {
        self.participants
            + self.groups
            + self.expenses
            + self.settlements
            + self.balances
            + self.comments
            + self.notifications
    }
}

impl fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} participants, {} groups, {} expenses, {} settlements, {} balances, {} comments, {} notifications",
            self.participants,
            self.groups,
            self.expenses,
            self.settlements,
            self.balances,
            self.comments,
            self.notifications
        )
    }
}

/// Sealed snapshot file
///
/// Unknown fields are refused so that a parsed envelope re-serializes to the
/// bytes its checksum covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    pub format_version: String,
    pub metadata: SnapshotMetadata,
    pub data: SnapshotData,
    pub settings: LedgerSettings,
    pub checksum: String,
}

impl Envelope {
    /// Build an unsealed full snapshot
    pub fn new(
        owner: impl Into<String>,
        source_store_id: impl Into<String>,
        mut data: SnapshotData,
        settings: LedgerSettings,
    ) -> Self {
        data.sort();
        Self {
            format_version: FORMAT_VERSION.to_string(),
            metadata: SnapshotMetadata {
                id: SnapshotId::new(),
                timestamp: Utc::now(),
                owner: owner.into(),
                app_version: APP_VERSION.to_string(),
                source_store_id: source_store_id.into(),
                snapshot_type: SnapshotType::Full,
            },
            data,
            settings,
            checksum: String::new(),
        }
    }

    /// Compute and store the checksum
    pub fn seal(&mut self) -> SplitResult<()> {
        self.checksum = self.compute_checksum()?;
        Ok(())
    }

    pub fn compute_checksum(&self) -> SplitResult<String> {
        let value = serde_json::to_value(self)?;
        checksum_of_value(&value)
    }

    /// Whether the stored checksum matches the content
    pub fn verify(&self) -> bool {
        !self.checksum.is_empty()
            && self
                .compute_checksum()
                .map(|c| c == self.checksum)
                .unwrap_or(false)
    }

    /// Serialized form for export and storage
    pub fn to_bytes(&self) -> SplitResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse without verifying the checksum
    pub fn from_bytes(bytes: &[u8]) -> SplitResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| SplitError::Integrity(vec![format!("malformed snapshot: {}", e)]))
    }
}

/// Digest of a raw envelope value with its checksum blanked
pub fn checksum_of_value(envelope: &Value) -> SplitResult<String> {
    let bytes = canonical_bytes(envelope)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn canonical_bytes(envelope: &Value) -> SplitResult<Vec<u8>> {
    let mut blanked = envelope.clone();
    if let Value::Object(map) = &mut blanked {
        map.insert("checksum".to_string(), Value::String(String::new()));
    }
    // serde_json's default map is ordered by key, so this is the sorted form
    Ok(serde_json::to_vec(&blanked)?)
}
