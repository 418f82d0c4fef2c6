//! Drag-and-drop reordering.
//!
//! A drag is tracked as values, not as rendered tiles: picking a tile up
//! records its entry id, hovering records the target id, and dropping
//! resolves both ids against the collection at that moment. The rendered
//! order during the drag never feeds back into the computation.
//!
//! A drop on tile `to` moves the dragged entry with standard list-move
//! semantics (see [`Collection::move_index`](crate::types::Collection::move_index)):
//! dragging forward lands the entry right after the target, dragging
//! backward lands it right before.
//!
//! ```text
//! [A, B, C, D]   drag A, drop on C   →  [B, C, A, D]
//! [A, B, C, D]   drag D, drop on A   →  [D, A, B, C]
//! ```
//!
//! Dropping on the dragged tile itself, or ending the drag outside any
//! tile, changes nothing.

use crate::store::{CollectionStore, KeyValueStore, StoreError};
use crate::types::Collection;

/// Result of a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The entry moved from one index to another.
    Moved { from: usize, to: usize },
    /// Dropped on the dragged tile.
    DroppedOnSelf,
    /// No drag was in progress.
    NoDrag,
    /// The dragged or target id is no longer in the collection.
    Stale,
}

/// One in-progress drag gesture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSession {
    dragged: Option<String>,
    over: Option<String>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up the tile of entry `id`. Replaces any abandoned drag.
    pub fn start(&mut self, id: impl Into<String>) {
        self.dragged = Some(id.into());
        self.over = None;
    }

    pub fn dragged(&self) -> Option<&str> {
        self.dragged.as_deref()
    }

    /// Tile currently highlighted as a drop target.
    pub fn over(&self) -> Option<&str> {
        self.over.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.dragged.is_some()
    }

    /// The pointer entered a tile. The dragged tile is never its own target.
    pub fn enter(&mut self, id: &str) {
        if self.dragged.is_some() && self.dragged.as_deref() != Some(id) {
            self.over = Some(id.to_string());
        }
    }

    /// The pointer left a tile.
    pub fn leave(&mut self, id: &str) {
        if self.over.as_deref() == Some(id) {
            self.over = None;
        }
    }

    /// Abandon the drag without a drop. Returns the id that was dragged.
    pub fn cancel(&mut self) -> Option<String> {
        self.over = None;
        self.dragged.take()
    }

    /// Drop on the tile of entry `target_id` and apply the move.
    ///
    /// The session ends whatever the outcome.
    pub fn drop_on<S: KeyValueStore>(
        &mut self,
        store: &mut CollectionStore<S>,
        target_id: &str,
    ) -> Result<DropOutcome, StoreError> {
        let Some(dragged) = self.cancel() else {
            return Ok(DropOutcome::NoDrag);
        };
        match resolve_drop(store.collection(), &dragged, target_id) {
            None => Ok(DropOutcome::Stale),
            Some((from, to)) if from == to => Ok(DropOutcome::DroppedOnSelf),
            Some((from, to)) => {
                store.move_index(from, to)?;
                log::debug!("moved entry {dragged} from {from} to {to}");
                Ok(DropOutcome::Moved { from, to })
            }
        }
    }
}

/// Resolve a drop to `(from, to)` indices in the collection.
pub fn resolve_drop(collection: &Collection, dragged_id: &str, target_id: &str) -> Option<(usize, usize)> {
    let from = collection.position(dragged_id)?;
    let to = collection.position(target_id)?;
    Some((from, to))
}
