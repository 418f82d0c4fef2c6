//! # Pocket Gal
//!
//! A small, user-curated, ordered image gallery. Images come in from local
//! files, folders or URLs, are kept in the order the user gives them, can be
//! captioned, reordered and deleted, and are browsed one at a time in a
//! full-screen viewer. The whole gallery survives restarts as a single
//! persisted record.
//!
//! # Architecture: One Collection, Many Gestures
//!
//! The ordered [`types::Collection`] is the only shared mutable state. Every
//! component reads and writes it through the [`store::CollectionStore`],
//! which persists the full sequence after every mutation:
//!
//! ```text
//!   ingest ─┐
//!  reorder ─┤
//!  caption ─┼──▶ CollectionStore ──save──▶ KeyValueStore (file / memory)
//!   delete ─┘          │
//!                      └──▶ Renderer (via gallery::Gallery)
//!   viewer  ◀── reads ──┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `ImageEntry`, entry ids, and the ordered `Collection` with its sequence transforms |
//! | [`store`] | Key-value substrate trait, file and memory substrates, persisted collection |
//! | [`naming`] | Display names from filenames and human-readable size labels |
//! | [`ingest`] | Filter, parallel read with an ordered join, URL probing, status events |
//! | [`reorder`] | Drag sessions resolving dragged and target ids to a list move |
//! | [`caption`] | The exclusive caption-edit session |
//! | [`viewer`] | Viewer state machine, key bindings, single/double click disambiguation |
//! | [`gallery`] | Facade tying state, renderer and prompts together |
//! | [`config`] | Layered `pocket-gal.toml` loading and validation |
//! | [`output`] | Text formatting of the gallery, viewer and ingestion progress |
//!
//! # Design Decisions
//!
//! ## Whole-Record Persistence
//!
//! The gallery is small and every mutation rewrites the full record. There is
//! no partial update and no journal: a record either parses completely or it
//! is discarded and the gallery starts empty. The file substrate writes
//! through a temporary file and a rename, so a crash leaves either the old
//! or the new record.
//!
//! ## Batches Keep Submission Order
//!
//! Files of a batch are read in parallel, but the batch is merged only after
//! every read settled and in the order the files were offered. A batch
//! inserted after a tile stays contiguous; the pending insert position is
//! consumed once per batch.
//!
//! ## Drags Are Values
//!
//! A drag records the dragged entry's id and resolves it, together with the
//! target id, against the collection at drop time. Nothing about the rendered
//! tiles feeds back into the move.

pub mod caption;
pub mod config;
pub mod gallery;
pub mod ingest;
pub mod naming;
pub mod output;
pub mod reorder;
pub mod store;
pub mod types;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_helpers;
