//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod expense;
pub mod group;
pub mod participant;
pub mod settle;

pub use backup::{handle_backup_command, handle_restore_command, BackupCommands, RestoreCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use group::{handle_group_command, GroupCommands};
pub use participant::{handle_participant_command, ParticipantCommands};
pub use settle::{
    handle_balances_command, handle_notifications_command, handle_settle_command, BalancesArgs,
    NotificationsArgs, SettleArgs,
};

use crate::audit::AuditLogger;
use crate::config::{Settings, SplitItPaths};
use crate::error::{SplitError, SplitResult};
use crate::models::ParticipantKey;
use crate::storage::{JsonStore, Ledger, RetryingStore};

/// The ledger the binary works against
pub type AppLedger = Ledger<RetryingStore<JsonStore>>;

/// Open the on-disk store with retries and audit logging enabled
pub async fn open_ledger(paths: &SplitItPaths, settings: &Settings) -> SplitResult<AppLedger> {
    let store = JsonStore::open(paths.clone()).await?;
    let store = RetryingStore::new(store, settings.retry.clone());
    Ok(Ledger::new(store).with_audit(AuditLogger::new(paths.audit_log())))
}

/// Participant acting on the command: `--as` if given, else the owner
pub fn resolve_actor(as_participant: Option<&str>, settings: &Settings) -> SplitResult<ParticipantKey> {
    match as_participant {
        Some(key) => Ok(ParticipantKey::new(key)),
        None if !settings.owner.trim().is_empty() => Ok(ParticipantKey::new(&settings.owner)),
        None => Err(SplitError::Config(
            "No owner configured. Run 'splitit init --owner <email>' or pass --as".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_actor() {
        let mut settings = Settings::default();
        assert!(matches!(
            resolve_actor(None, &settings),
            Err(SplitError::Config(_))
        ));

        settings.owner = "Ana@X.com".into();
        assert_eq!(
            resolve_actor(None, &settings).unwrap(),
            ParticipantKey::new("ana@x.com")
        );
        assert_eq!(
            resolve_actor(Some("bo"), &settings).unwrap(),
            ParticipantKey::new("bo")
        );
    }
}
