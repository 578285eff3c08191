//! JSON-file ledger store
//!
//! Keeps each collection in memory as a key-ordered map and writes the whole
//! collection back to `data/<collection>.json` (an object keyed by primary
//! key) after every mutation. Files are loaded lazily on first access.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{LedgerSettings, SplitItPaths};
use crate::error::StoreError;

use super::file_io::{read_json, write_json_atomic};
use super::{LedgerStore, Record};

type Collection = BTreeMap<String, serde_json::Value>;

/// Identity file written once per data directory
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreMeta {
    #[serde(default)]
    store_id: String,
}

pub struct JsonStore {
    paths: SplitItPaths,
    store_id: String,
    collections: Mutex<HashMap<&'static str, Collection>>,
}

impl JsonStore {
    /// Open the store rooted at `paths`, creating its identity on first use
    pub async fn open(paths: SplitItPaths) -> Result<Self, StoreError> {
        let meta_path = paths.data_dir().join("store.json");
        let mut meta: StoreMeta = read_json(&meta_path, "store").await?;

        if meta.store_id.is_empty() {
            meta.store_id = uuid::Uuid::new_v4().to_string();
            write_json_atomic(&meta_path, &meta).await?;
        }

        debug!(store_id = %meta.store_id, dir = %paths.data_dir().display(), "opened json store");

        Ok(Self {
            paths,
            store_id: meta.store_id,
            collections: Mutex::new(HashMap::new()),
        })
    }

    async fn load_collection(&self, name: &'static str) -> Result<Collection, StoreError> {
        read_json(self.paths.collection_file(name), name).await
    }

    async fn persist(&self, name: &'static str, collection: &Collection) -> Result<(), StoreError> {
        write_json_atomic(self.paths.collection_file(name), collection).await
    }

    /// Run `f` against a loaded collection; persist if it reports a change
    async fn with_collection<T, R, F>(&self, f: F) -> Result<R, StoreError>
    where
        T: Record,
        F: FnOnce(&mut Collection) -> Result<(R, bool), StoreError> + Send,
        R: Send,
    {
        let mut collections = self.collections.lock().await;

        if !collections.contains_key(T::COLLECTION) {
            let loaded = self.load_collection(T::COLLECTION).await?;
            collections.insert(T::COLLECTION, loaded);
        }

        let collection = collections
            .get_mut(T::COLLECTION)
            .ok_or_else(|| StoreError::Io(format!("collection {} not loaded", T::COLLECTION)))?;

        let mut staged = collection.clone();
        let (result, changed) = f(&mut staged)?;
        if changed {
            self.persist(T::COLLECTION, &staged).await?;
            *collection = staged;
        }
        Ok(result)
    }
}

fn decode<T: Record>(value: &serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(value.clone()).map_err(|e| StoreError::Corrupt {
        kind: T::COLLECTION,
        reason: e.to_string(),
    })
}

fn encode<T: Record>(record: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Io(format!("Failed to serialize: {}", e)))
}

#[async_trait]
impl LedgerStore for JsonStore {
    fn store_id(&self) -> &str {
        &self.store_id
    }

    async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        self.with_collection::<T, _, _>(|c| {
            let records = c.values().map(decode::<T>).collect::<Result<Vec<_>, _>>()?;
            Ok((records, false))
        })
        .await
    }

    async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.with_collection::<T, _, _>(|c| {
            let record = c.get(id).map(decode::<T>).transpose()?;
            Ok((record, false))
        })
        .await
    }

    async fn create<T: Record>(&self, record: T) -> Result<T, StoreError> {
        let value = encode(&record)?;
        let key = record.key();
        self.with_collection::<T, _, _>(move |c| {
            c.insert(key, value);
            Ok(((), true))
        })
        .await?;
        Ok(record)
    }

    async fn update<T: Record>(&self, id: &str, record: T) -> Result<Option<T>, StoreError> {
        let value = encode(&record)?;
        let found = self
            .with_collection::<T, _, _>(|c| match c.get_mut(id) {
                Some(slot) => {
                    *slot = value;
                    Ok((true, true))
                }
                None => Ok((false, false)),
            })
            .await?;
        Ok(found.then_some(record))
    }

    async fn delete<T: Record>(&self, id: &str) -> Result<bool, StoreError> {
        self.with_collection::<T, _, _>(|c| {
            let removed = c.remove(id).is_some();
            Ok((removed, removed))
        })
        .await
    }

    async fn read_settings(&self) -> Result<LedgerSettings, StoreError> {
        read_json(self.paths.store_settings_file(), "settings").await
    }

    async fn write_settings(&self, settings: LedgerSettings) -> Result<(), StoreError> {
        write_json_atomic(self.paths.store_settings_file(), &settings).await
    }
}
