//! Persistence of the collection.
//!
//! The collection lives in a single record of a key-value substrate. The
//! record holds the whole sequence as a JSON array; there is no partial
//! update. Every mutation through [`CollectionStore`] rewrites the record
//! before returning, so the in-memory collection and the stored one never
//! drift apart.
//!
//! ## Substrates
//!
//! - [`FileStore`]: one `<key>.json` file per key in a data directory.
//!   Writes go to a temporary file that is renamed over the target, so a
//!   reader never sees a half-written record.
//! - [`MemoryStore`]: a map held in memory, for tests and embedding.
//!
//! ## Recovery
//!
//! A missing record is an empty collection. A record that does not parse
//! (or that holds duplicate ids) is logged, deleted, and also treated as an
//! empty collection. The next save overwrites whatever was there. Only I/O
//! failures of the substrate itself are reported as errors.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{Collection, ImageEntry};

/// Record key used when the configuration does not name one.
pub const DEFAULT_RECORD_KEY: &str = "galleryImages";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid record key: {0:?}")]
    InvalidKey(String),
}

/// A string-to-string persistent map.
pub trait KeyValueStore {
    /// Read a record. `Ok(None)` if the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a record, replacing any previous value atomically.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a record. Deleting a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// Substrates
// =============================================================================

/// In-memory substrate.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.remove(key);
        Ok(())
    }
}

/// File-per-key substrate rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// Keys are restricted to ASCII alphanumerics, `-` and `_` so a key can
    /// never escape the data directory.
    pub fn record_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.record_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.record_path(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.record_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Collection store
// =============================================================================

/// Serialize a collection into its persisted form.
pub fn serialize(collection: &Collection) -> Result<String, StoreError> {
    Ok(serde_json::to_string(collection)?)
}

/// Parse a persisted record. `None` if it is not a valid collection.
pub fn parse(record: &str) -> Option<Collection> {
    let entries: Vec<ImageEntry> = serde_json::from_str(record).ok()?;
    Collection::from_entries(entries).ok()
}

/// Load the collection stored under `key`.
///
/// A corrupt record is removed from the substrate and an empty collection
/// is returned in its place.
pub fn load<S: KeyValueStore>(substrate: &mut S, key: &str) -> Result<Collection, StoreError> {
    let Some(record) = substrate.get(key)? else {
        return Ok(Collection::new());
    };
    match parse(&record) {
        Some(collection) => Ok(collection),
        None => {
            log::warn!("discarding corrupt gallery record {key:?}");
            substrate.remove(key)?;
            Ok(Collection::new())
        }
    }
}

/// Write the full collection under `key`.
pub fn save<S: KeyValueStore>(
    substrate: &mut S,
    key: &str,
    collection: &Collection,
) -> Result<(), StoreError> {
    let record = serialize(collection)?;
    substrate.set(key, &record)
}

/// The collection together with the substrate it is persisted to.
///
/// This is the single owner of the collection. Reads go through
/// [`collection`](Self::collection); every mutating method applies the
/// transform and then saves, and only saves when something changed.
#[derive(Debug)]
pub struct CollectionStore<S: KeyValueStore> {
    substrate: S,
    key: String,
    collection: Collection,
}

impl<S: KeyValueStore> CollectionStore<S> {
    /// Hydrate from the substrate.
    pub fn open(mut substrate: S, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        let collection = load(&mut substrate, &key)?;
        Ok(Self {
            substrate,
            key,
            collection,
        })
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Re-read the record, discarding in-memory state.
    pub fn reload(&mut self) -> Result<&Collection, StoreError> {
        self.collection = load(&mut self.substrate, &self.key)?;
        Ok(&self.collection)
    }

    /// Persist the whole collection.
    pub fn save(&mut self) -> Result<(), StoreError> {
        save(&mut self.substrate, &self.key, &self.collection)
    }

    pub fn append(&mut self, entry: ImageEntry) -> Result<bool, StoreError> {
        self.apply(|c| c.append(entry), |appended| *appended)
    }

    pub fn insert_at(&mut self, index: usize, entry: ImageEntry) -> Result<Option<usize>, StoreError> {
        self.apply(|c| c.insert_at(index, entry), Option::is_some)
    }

    pub fn insert_run_at(&mut self, index: usize, run: Vec<ImageEntry>) -> Result<usize, StoreError> {
        self.apply(|c| c.insert_run_at(index, run), |inserted| *inserted > 0)
    }

    pub fn remove_by_id(&mut self, id: &str) -> Result<Option<(usize, ImageEntry)>, StoreError> {
        self.apply(|c| c.remove_by_id(id), Option::is_some)
    }

    pub fn move_index(&mut self, from: usize, to: usize) -> Result<bool, StoreError> {
        self.apply(|c| c.move_index(from, to), |moved| *moved)
    }

    pub fn update_caption(&mut self, id: &str, text: &str) -> Result<bool, StoreError> {
        self.apply(|c| c.update_caption(id, text), |updated| *updated)
    }

    /// Run `transform` on a copy and adopt it only once it has been saved.
    ///
    /// A failed save leaves the in-memory collection as it was. Transforms
    /// that report no change are not saved.
    fn apply<T>(
        &mut self,
        transform: impl FnOnce(&mut Collection) -> T,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T, StoreError> {
        let mut next = self.collection.clone();
        let outcome = transform(&mut next);
        if changed(&outcome) {
            save(&mut self.substrate, &self.key, &next)?;
            self.collection = next;
        }
        Ok(outcome)
    }
}
