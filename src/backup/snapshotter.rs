//! Backup snapshotter
//!
//! Captures the full ledger into a sealed [`Envelope`], keeps the most recent
//! snapshots on disk, and records them in a small history index. When the
//! index grows past the retention cap the oldest snapshots are evicted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::config::{SnapshotRetention, SplitItPaths};
use crate::error::{SplitError, SplitResult};
use crate::models::SnapshotId;
use crate::storage::file_io::{read_json, write_json_atomic};
use crate::storage::{Ledger, LedgerStore};

use super::envelope::{EntityCounts, Envelope, SnapshotData};

/// Entry in the snapshot history index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub id: SnapshotId,
    pub timestamp: DateTime<Utc>,
    pub owner: String,
    /// File name inside the snapshot directory
    pub filename: String,
    pub checksum: String,
    pub counts: EntityCounts,
    pub size_bytes: u64,
}

/// Oldest first
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotIndex {
    #[serde(default)]
    snapshots: Vec<SnapshotInfo>,
}

pub struct Snapshotter<'a, S> {
    ledger: &'a Ledger<S>,
    paths: SplitItPaths,
    retention: SnapshotRetention,
}

impl<'a, S: LedgerStore> Snapshotter<'a, S> {
    pub fn new(ledger: &'a Ledger<S>, paths: SplitItPaths, retention: SnapshotRetention) -> Self {
        Self {
            ledger,
            paths,
            retention,
        }
    }

    /// Snapshot the whole store and add it to the history
    pub async fn create(&self, owner: &str, store_id: &str) -> SplitResult<Envelope> {
        let store = self.ledger.store();
        let data = SnapshotData {
            participants: store.list().await?,
            groups: store.list().await?,
            expenses: store.list().await?,
            settlements: store.list().await?,
            balances: store.list().await?,
            comments: store.list().await?,
            notifications: store.list().await?,
        };
        let settings = store.read_settings().await?;

        let mut envelope = Envelope::new(owner, store_id, data, settings);
        envelope.seal()?;

        let info = self.persist(&envelope).await?;
        let evicted = self.record(info).await?;

        info!(
            snapshot_id = %envelope.metadata.id,
            records = envelope.data.counts().total(),
            evicted,
            "created snapshot"
        );
        Ok(envelope)
    }

    async fn persist(&self, envelope: &Envelope) -> SplitResult<SnapshotInfo> {
        let dir = self.paths.snapshot_dir();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SplitError::Io(format!("Failed to create snapshot directory: {}", e)))?;

        let meta = &envelope.metadata;
        let filename = format!(
            "snapshot-{}-{}.json",
            meta.timestamp.format("%Y%m%d-%H%M%S-%3f"),
            &meta.id.key()[..8]
        );
        let bytes = envelope.to_bytes()?;
        fs::write(dir.join(&filename), &bytes)
            .await
            .map_err(|e| SplitError::Io(format!("Failed to write snapshot: {}", e)))?;

        Ok(SnapshotInfo {
            id: meta.id,
            timestamp: meta.timestamp,
            owner: meta.owner.clone(),
            filename,
            checksum: envelope.checksum.clone(),
            counts: envelope.data.counts(),
            size_bytes: bytes.len() as u64,
        })
    }

    /// Append to the index and evict beyond the cap; returns the eviction count
    async fn record(&self, info: SnapshotInfo) -> SplitResult<usize> {
        let mut index = self.read_index().await?;
        index.snapshots.push(info);

        let cap = self.retention.max_snapshots.max(1) as usize;
        let excess = index.snapshots.len().saturating_sub(cap);
        let evicted: Vec<SnapshotInfo> = index.snapshots.drain(..excess).collect();

        write_json_atomic(self.paths.snapshot_index(), &index)
            .await
            .map_err(|e| SplitError::Io(e.to_string()))?;

        for old in &evicted {
            let path = self.paths.snapshot_dir().join(&old.filename);
            if let Err(e) = fs::remove_file(&path).await {
                warn!(file = %path.display(), error = %e, "could not delete evicted snapshot");
            }
        }
        Ok(evicted.len())
    }

    async fn read_index(&self) -> SplitResult<SnapshotIndex> {
        read_json(self.paths.snapshot_index(), "snapshot index")
            .await
            .map_err(|e| SplitError::Io(e.to_string()))
    }

    /// Retained snapshots, newest first
    pub async fn history(&self) -> SplitResult<Vec<SnapshotInfo>> {
        let mut snapshots = self.read_index().await?.snapshots;
        snapshots.reverse();
        Ok(snapshots)
    }

    pub async fn latest(&self) -> SplitResult<Option<Envelope>> {
        match self.history().await?.into_iter().next() {
            Some(info) => Ok(Some(self.read_file(&info).await?)),
            None => Ok(None),
        }
    }

    /// Load a retained snapshot by full id or short id (`snap-1a2b3c4d`)
    pub async fn load(&self, identifier: &str) -> SplitResult<Envelope> {
        let identifier = identifier.trim();
        let info = self
            .history()
            .await?
            .into_iter()
            .find(|s| s.id.key() == identifier || s.id.to_string() == identifier)
            .ok_or_else(|| SplitError::snapshot_not_found(identifier))?;
        self.read_file(&info).await
    }

    async fn read_file(&self, info: &SnapshotInfo) -> SplitResult<Envelope> {
        let path = self.paths.snapshot_dir().join(&info.filename);
        let bytes = fs::read(&path)
            .await
            .map_err(|e| SplitError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Envelope::from_bytes(&bytes)
    }

    /// Bytes to hand to the user for safekeeping
    pub fn export(&self, envelope: &Envelope) -> SplitResult<Vec<u8>> {
        envelope.to_bytes()
    }
}
