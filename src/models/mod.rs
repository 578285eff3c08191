//! Core data models for SplitIt
//!
//! This module contains the data structures of the shared-expense domain:
//! participants, groups, expenses, settlements, and the derived balance edges.

pub mod amount;
pub mod balance;
pub mod comment;
pub mod expense;
pub mod group;
pub mod ids;
pub mod notification;
pub mod participant;
pub mod settlement;

use chrono::{DateTime, Utc};

pub use balance::BalanceEdge;
pub use comment::Comment;
pub use expense::{compute_splits, Expense, Split, SplitShare, SplitType};
pub use group::Group;
pub use ids::{CommentId, ExpenseId, GroupId, NotificationId, ParticipantKey, SettlementId, SnapshotId};
pub use notification::{Notification, NotificationKind};
pub use participant::Participant;
pub use settlement::Settlement;

/// Entities that can be edited and therefore carry a last-modified time
///
/// Used for last-write-wins decisions when merging a snapshot.
pub trait Recency {
    /// `updated_at` where present, otherwise `created_at`
    fn recency(&self) -> DateTime<Utc>;
}
