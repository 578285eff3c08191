//! Service layer for SplitIt
//!
//! Services add validation, balance maintenance, notifications, and audit
//! logging on top of the raw store. Each borrows a shared [`Ledger`].
//!
//! [`Ledger`]: crate::storage::Ledger

pub mod balance;
pub mod expense;
pub mod group;
pub mod notification;
pub mod participant;
pub mod settlement;

pub use balance::BalanceService;
pub use expense::{ExpenseEdit, ExpenseInput, ExpenseService};
pub use group::GroupService;
pub use notification::NotificationService;
pub use participant::ParticipantService;
pub use settlement::{SettlementInput, SettlementService};
