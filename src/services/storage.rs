use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when reading or writing a collection
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error in collection '{collection}': {source}")]
    Serialization {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
}

/// Named, whole-overwritten record sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    BloodRequests,
    Donations,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Users, Collection::BloodRequests, Collection::Donations];

    /// Storage key, unchanged from the browser-era layout
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::BloodRequests => "bloodRequests",
            Collection::Donations => "donations",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Key-value persistence for record collections
///
/// A collection that was never saved loads as empty. Saves replace the whole
/// collection; there is no atomicity across collections.
pub trait Storage {
    fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StorageError>;

    fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<(), StorageError>;
}

fn decode<T: DeserializeOwned>(collection: Collection, raw: &str) -> Result<Vec<T>, StorageError> {
    // A stored `null` is treated like a missing key
    let records: Option<Vec<Value>> = serde_json::from_str(raw)
        .map_err(|source| StorageError::Serialization { collection, source })?;

    // Each record goes through a `Value` first; a repeated key keeps its last value
    records
        .unwrap_or_default()
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| StorageError::Serialization { collection, source })
}

fn encode<T: Serialize>(collection: Collection, records: &[T]) -> Result<String, StorageError> {
    serde_json::to_string_pretty(records)
        .map_err(|source| StorageError::Serialization { collection, source })
}

/// One `<key>.json` file per collection under a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.key()))
    }
}

impl Storage for JsonFileStore {
    fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StorageError> {
        let path = self.path_for(collection);
        match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Ok(raw) => decode(collection, &raw),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("Collection '{}' not initialized at {}", collection, path.display());
                Ok(Vec::new())
            }
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<(), StorageError> {
        let path = self.path_for(collection);
        let json = encode(collection, records)?;

        // Write beside the target then rename, so a crash never leaves half a file
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(|source| StorageError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::trace!("Saved {} records to '{}'", records.len(), collection);
        Ok(())
    }
}

/// In-process store holding each collection as JSON text
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<Collection, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with raw JSON, as a browser profile would hold it
    pub fn with_raw(self, collection: Collection, json: impl Into<String>) -> Self {
        self.entries.borrow_mut().insert(collection, json.into());
        self
    }

    pub fn raw(&self, collection: Collection) -> Option<String> {
        self.entries.borrow().get(&collection).cloned()
    }
}

impl Storage for MemoryStore {
    fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StorageError> {
        match self.entries.borrow().get(&collection) {
            Some(raw) => decode(collection, raw),
            None => Ok(Vec::new()),
        }
    }

    fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<(), StorageError> {
        let json = encode(collection, records)?;
        self.entries.borrow_mut().insert(collection, json);
        Ok(())
    }
}
