//! Backup and restore for SplitIt
//!
//! # Architecture
//!
//! - `Snapshotter`: captures the ledger into a sealed envelope and keeps a
//!   bounded history of snapshots on disk
//! - `Reconciler`: validates a snapshot and writes it back in replace or
//!   merge mode, then rebuilds balances
//!
//! # Retention Policy
//!
//! The five most recent snapshots are kept by default. Older ones are
//! removed from the index and deleted from disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use splitit::backup::{Reconciler, RestoreMode, Snapshotter};
//! use splitit::concurrency::CancelToken;
//!
//! let snapshotter = Snapshotter::new(&ledger, paths, settings.snapshot_retention);
//! let envelope = snapshotter.create("ana@example.com", ledger.store().store_id()).await?;
//!
//! let reconciler = Reconciler::new(&ledger);
//! let summary = reconciler
//!     .apply(&envelope, RestoreMode::Merge, &CancelToken::never())
//!     .await?;
//! println!("{}", summary.summary());
//! ```

pub mod envelope;
mod restore;
mod snapshotter;

pub use envelope::{EntityCounts, Envelope, SnapshotData, SnapshotMetadata, SnapshotType};
pub use restore::{
    ConflictInfo, Outcome, Reconciler, RestoreMode, RestorePreview, RestoreSummary,
    ValidationReport,
};
pub use snapshotter::{SnapshotInfo, Snapshotter};
