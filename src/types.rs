//! The collection data model.
//!
//! A [`Collection`] is an ordered sequence of [`ImageEntry`] values. Order is
//! the only ranking: there is no position field on an entry, an entry's
//! position is its index. The sequence is serialized as a plain JSON array,
//! so the persisted order and the display order are the same thing.
//!
//! All transforms here are pure in-memory operations. Persisting them is the
//! job of [`crate::store::CollectionStore`], which wraps every transform with
//! a full save.
//!
//! ## Invariants
//!
//! - Ids are pairwise distinct. Transforms that add entries refuse ids that
//!   are already present, and a persisted record with duplicate ids is
//!   treated as corrupt.
//! - Out-of-range indices never panic. Insertion clamps, moves and removals
//!   report that nothing happened.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::naming::{UNKNOWN_SIZE, URL_ENTRY_NAME};

/// One image in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Opaque, unique for the lifetime of the collection.
    pub id: String,
    /// `data:` payload for local files, the external URL otherwise.
    pub src: String,
    /// Filename without extension, or a placeholder for URL entries.
    pub name: String,
    /// Human-readable size label, `"Unknown"` for URL entries.
    pub size: String,
    /// User-editable text, initially equal to `name`.
    pub caption: String,
}

impl ImageEntry {
    /// Create an entry with a fresh id. The caption starts out as the name.
    pub fn new(src: impl Into<String>, name: impl Into<String>, size: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: new_entry_id(),
            src: src.into(),
            caption: name.clone(),
            name,
            size: size.into(),
        }
    }

    /// Create an entry pointing at an external URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new(url, URL_ENTRY_NAME, UNKNOWN_SIZE)
    }

    /// Text shown on tiles and in the viewer: the caption, or the name when
    /// the caption has been cleared.
    pub fn display_caption(&self) -> &str {
        if self.caption.is_empty() {
            &self.name
        } else {
            &self.caption
        }
    }
}

/// Generate a new entry id.
///
/// Random v4 UUIDs, so ids created in the same millisecond (a batch of
/// files finishing together) still never collide.
pub fn new_entry_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// The ordered image collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    entries: Vec<ImageEntry>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from entries, rejecting duplicate ids.
    ///
    /// Returns the first duplicated id on failure.
    pub fn from_entries(entries: Vec<ImageEntry>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(entry.id.clone());
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ImageEntry> {
        self.entries.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&ImageEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Index of the entry with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Add an entry at the end. Returns `false` if its id is already taken.
    pub fn append(&mut self, entry: ImageEntry) -> bool {
        if self.contains(&entry.id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Insert an entry at `index`, clamped to `[0, len]`.
    ///
    /// Returns the index the entry landed at, or `None` if its id is taken.
    pub fn insert_at(&mut self, index: usize, entry: ImageEntry) -> Option<usize> {
        if self.contains(&entry.id) {
            return None;
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
        Some(index)
    }

    /// Insert a run of entries as one contiguous block starting at `index`
    /// (clamped to `[0, len]`), keeping the run's order.
    ///
    /// Entries whose id is already present, in the collection or earlier in
    /// the run, are dropped. Returns how many were inserted.
    pub fn insert_run_at(&mut self, index: usize, run: Vec<ImageEntry>) -> usize {
        let mut taken: HashSet<String> = self.entries.iter().map(|e| e.id.clone()).collect();
        let run: Vec<ImageEntry> = run
            .into_iter()
            .filter(|e| taken.insert(e.id.clone()))
            .collect();
        let count = run.len();
        let index = index.min(self.entries.len());
        self.entries.splice(index..index, run);
        count
    }

    /// Remove the entry with the given id, returning its former index and
    /// the entry itself.
    pub fn remove_by_id(&mut self, id: &str) -> Option<(usize, ImageEntry)> {
        let index = self.position(id)?;
        Some((index, self.entries.remove(index)))
    }

    /// Standard list move: remove the element at `from`, then insert it at
    /// `to` in the array that remains after the removal.
    ///
    /// `[A,B,C,D]` with `move_index(0, 2)` gives `[B,C,A,D]`;
    /// `move_index(3, 0)` gives `[D,A,B,C]`.
    ///
    /// Returns `false` (and leaves the collection untouched) when
    /// `from == to` or either index is out of range.
    pub fn move_index(&mut self, from: usize, to: usize) -> bool {
        let len = self.entries.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let moved = self.entries.remove(from);
        self.entries.insert(to, moved);
        true
    }

    /// Replace the caption of one entry. Returns `false` if no entry has
    /// that id.
    pub fn update_caption(&mut self, id: &str, text: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.caption = text.into();
                true
            }
            None => false,
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a ImageEntry;
    type IntoIter = std::slice::Iter<'a, ImageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
