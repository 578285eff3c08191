//! Audit log for SplitIt
//!
//! Every mutation a service performs (participants, groups, expenses,
//! settlements, restores) is appended to a JSONL file next to the data
//! directory. The log is informational; nothing reads it back to rebuild
//! state.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
