//! Display formatting for terminal output
//!
//! Turns groups, expenses, balances, and snapshots into aligned plain-text
//! tables. Every formatter returns a `String`; printing is left to the CLI.

pub mod balance;
pub mod expense;
pub mod group;
pub mod snapshot;

pub use balance::{format_balances, format_net_positions};
pub use expense::{format_expense_details, format_expense_list};
pub use group::{format_group_details, format_group_list};
pub use snapshot::{format_preview, format_snapshot_history};
