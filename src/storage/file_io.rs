//! File I/O utilities with atomic writes
//!
//! Async counterparts of plain JSON reads and writes that never leave a
//! half-written file behind.

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// Read JSON from a file, returning a default value if the file doesn't exist
pub async fn read_json<T, P>(path: P, kind: &'static str) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => {
            return Err(StoreError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        kind,
        reason: format!("{}: {}", path.display(), e),
    })
}

/// Write JSON to a file atomically (write to temp, sync, then rename)
pub async fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            StoreError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let json = serde_json::to_vec_pretty(data)
        .map_err(|e| StoreError::Io(format!("Failed to serialize data: {}", e)))?;

    let temp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| StoreError::Io(format!("Failed to create temp file: {}", e)))?;
    file.write_all(&json)
        .await
        .map_err(|e| StoreError::Io(format!("Failed to write data: {}", e)))?;
    file.sync_all()
        .await
        .map_err(|e| StoreError::Io(format!("Failed to sync data: {}", e)))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::Io(format!("Failed to rename temp file: {}", e)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[tokio::test]
    async fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: TestData = read_json(temp_dir.path().join("missing.json"), "test")
            .await
            .unwrap();
        assert_eq!(data, TestData::default());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("test.json");
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_json_atomic(&path, &data).await.unwrap();
        assert!(path.exists());
        assert!(!temp_dir.path().join("nested").join("test.json.tmp").exists());

        let loaded: TestData = read_json(&path, "test").await.unwrap();
        assert_eq!(data, loaded);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_not_transient() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "not json at all").unwrap();

        let err = read_json::<TestData, _>(&path, "test").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { kind: "test", .. }));
        assert!(!err.is_transient());
    }
}
