//! SplitIt - shared expense ledger with debt simplification
//!
//! This library tracks expenses and settlements inside groups of
//! participants, reduces the history to the smallest set of "who owes whom"
//! edges, and takes checksummed snapshots that can be restored by replacing
//! or merging into an existing ledger.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (participants, groups, expenses, etc.)
//! - `netting`: Pure debt netting engine
//! - `storage`: Ledger store trait, JSON file store, and retry decorator
//! - `concurrency`: Per-group locks and cancellation tokens
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `backup`: Snapshots and restore reconciliation
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use splitit::config::{SplitItPaths, Settings};
//! use splitit::services::{ExpenseInput, ExpenseService, GroupService};
//!
//! let paths = SplitItPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let ledger = splitit::cli::open_ledger(&paths, &settings).await?;
//!
//! let group = GroupService::new(&ledger)
//!     .create("Trip", "USD", "ana@x.com".into(), vec!["bo@x.com".into()])
//!     .await?;
//! ExpenseService::new(&ledger)
//!     .create(ExpenseInput::equal(group.id, "Fuel", "ana@x.com".into(), 40.0))
//!     .await?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod netting;
pub mod services;
pub mod storage;

pub use error::{SplitError, SplitResult};
