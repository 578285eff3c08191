//! Configuration module for SplitIt
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence
//! - Retry and retention policies

pub mod paths;
pub mod settings;

pub use paths::SplitItPaths;
pub use settings::{LedgerSettings, RetryPolicy, Settings, SnapshotRetention};
