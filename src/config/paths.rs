//! Path management for SplitIt
//!
//! Provides XDG-compliant path resolution for configuration, ledger data, and
//! snapshots.
//!
//! ## Path Resolution Order
//!
//! 1. `SPLITIT_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/splitit` or `~/.config/splitit`
//! 3. Windows: `%APPDATA%\splitit`

use std::path::PathBuf;

use crate::error::SplitError;

/// Manages all paths used by SplitIt
#[derive(Debug, Clone)]
pub struct SplitItPaths {
    base_dir: PathBuf,
}

impl SplitItPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home or config directory can be determined.
    pub fn new() -> Result<Self, SplitError> {
        let base_dir = if let Ok(custom) = std::env::var("SPLITIT_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding one JSON file per entity collection
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Directory holding snapshot envelopes and the history index
    pub fn snapshot_dir(&self) -> PathBuf {
        self.base_dir.join("snapshots")
    }

    pub fn snapshot_index(&self) -> PathBuf {
        self.snapshot_dir().join("history.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Shared preferences exported with snapshots
    pub fn store_settings_file(&self) -> PathBuf {
        self.data_dir().join("settings.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Path of the JSON file backing one entity collection
    pub fn collection_file(&self, collection: &str) -> PathBuf {
        self.data_dir().join(format!("{}.json", collection))
    }

    /// Ensure the base, data, and snapshot directories exist
    pub fn ensure_directories(&self) -> Result<(), SplitError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| SplitError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| SplitError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.snapshot_dir()).map_err(|e| {
            SplitError::Io(format!("Failed to create snapshot directory: {}", e))
        })?;

        Ok(())
    }

    /// Check if SplitIt has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, SplitError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("splitit"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| SplitError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".config").join("splitit"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, SplitError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| SplitError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("splitit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SplitItPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.snapshot_dir(), temp_dir.path().join("snapshots"));
        assert_eq!(
            paths.collection_file("expenses"),
            temp_dir.path().join("data").join("expenses.json")
        );
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SplitItPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.snapshot_dir().exists());
        assert!(!paths.is_initialized());
    }
}
