//! In-place caption editing.
//!
//! At most one entry is mid-edit. Beginning an edit on another entry first
//! commits the one in progress, the same way focusing a second field blurs
//! the first. A commit writes the buffer through the store and refreshes
//! the viewer if it is showing the edited entry.

use std::ops::Range;

use crate::store::{CollectionStore, KeyValueStore, StoreError};
use crate::viewer::{Key, Viewer};

/// An edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionEdit {
    pub id: String,
    pub buffer: String,
    /// Selected byte range of `buffer`.
    pub selection: Range<usize>,
}

/// A finished edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub id: String,
    pub caption: String,
    /// False when the entry vanished while it was being edited.
    pub applied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CaptionEditor {
    active: Option<CaptionEdit>,
}

impl CaptionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&CaptionEdit> {
        self.active.as_ref()
    }

    pub fn editing(&self) -> Option<&str> {
        self.active.as_ref().map(|edit| edit.id.as_str())
    }

    /// Start editing entry `id` with its whole caption selected.
    ///
    /// Any edit in progress is committed first and returned. Unknown ids
    /// start nothing.
    pub fn begin<S: KeyValueStore>(
        &mut self,
        store: &mut CollectionStore<S>,
        viewer: &mut Viewer,
        id: &str,
    ) -> Result<Option<Committed>, StoreError> {
        if self.editing() == Some(id) {
            return Ok(None);
        }
        let previous = self.commit(store, viewer)?;
        if let Some(entry) = store.collection().find(id) {
            let buffer = entry.display_caption().to_string();
            self.active = Some(CaptionEdit {
                id: id.to_string(),
                selection: 0..buffer.len(),
                buffer,
            });
        }
        Ok(previous)
    }

    /// Replace the selected text with `text`; the caret ends after it.
    pub fn type_text(&mut self, text: &str) {
        if let Some(edit) = self.active.as_mut() {
            let range = clamp(&edit.buffer, edit.selection.clone());
            edit.buffer.replace_range(range.clone(), text);
            let caret = range.start + text.len();
            edit.selection = caret..caret;
        }
    }

    /// Replace the whole buffer.
    pub fn set_text(&mut self, text: impl Into<String>) {
        if let Some(edit) = self.active.as_mut() {
            edit.buffer = text.into();
            let end = edit.buffer.len();
            edit.selection = end..end;
        }
    }

    /// Enter commits; other keys are left to the caller.
    pub fn handle_key<S: KeyValueStore>(
        &mut self,
        key: Key,
        store: &mut CollectionStore<S>,
        viewer: &mut Viewer,
    ) -> Result<Option<Committed>, StoreError> {
        match key {
            Key::Enter => self.commit(store, viewer),
            _ => Ok(None),
        }
    }

    /// Write the buffer as the entry's caption and end the edit.
    pub fn commit<S: KeyValueStore>(
        &mut self,
        store: &mut CollectionStore<S>,
        viewer: &mut Viewer,
    ) -> Result<Option<Committed>, StoreError> {
        let Some(edit) = self.active.take() else {
            return Ok(None);
        };
        let applied = store.collection().contains(&edit.id);
        if applied {
            store.update_caption(&edit.id, &edit.buffer)?;
            viewer.refresh(store.collection(), &edit.id);
        }
        Ok(Some(Committed {
            id: edit.id,
            caption: edit.buffer,
            applied,
        }))
    }

    /// Drop the edit if it targets `id`, which was removed.
    pub fn entry_removed(&mut self, id: &str) {
        if self.editing() == Some(id) {
            self.active = None;
        }
    }
}

fn clamp(buffer: &str, range: Range<usize>) -> Range<usize> {
    let mut end = range.end.min(buffer.len());
    while !buffer.is_char_boundary(end) {
        end -= 1;
    }
    let mut start = range.start.min(end);
    while !buffer.is_char_boundary(start) {
        start -= 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DEFAULT_RECORD_KEY, MemoryStore, parse};
    use crate::test_helpers::*;

    fn setup(names: &[&str]) -> (CollectionStore<MemoryStore>, Viewer, Vec<String>) {
        let mut store = CollectionStore::open(MemoryStore::new(), DEFAULT_RECORD_KEY).unwrap();
        for n in names {
            store.append(entry(n)).unwrap();
        }
        let ids = ids(store.collection());
        (store, Viewer::new(), ids)
    }

    #[test]
    fn begin_selects_whole_caption() {
        let (mut store, mut viewer, ids) = setup(&["sunset"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[0]).unwrap();

        let edit = editor.active().unwrap();
        assert_eq!(edit.buffer, "sunset");
        assert_eq!(edit.selection, 0..6);
    }

    #[test]
    fn typing_replaces_selection() {
        let (mut store, mut viewer, ids) = setup(&["sunset"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[0]).unwrap();
        editor.type_text("Beach");
        editor.type_text(" day");
        assert_eq!(editor.active().unwrap().buffer, "Beach day");
    }

    #[test]
    fn commit_persists_caption() {
        let (mut store, mut viewer, ids) = setup(&["A", "B"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[1]).unwrap();
        editor.set_text("second");

        let done = editor.commit(&mut store, &mut viewer).unwrap().unwrap();

        assert!(done.applied);
        assert_eq!(editor.editing(), None);
        assert_eq!(store.collection().get(1).unwrap().caption, "second");
        let record = store.substrate().get(DEFAULT_RECORD_KEY).unwrap().unwrap();
        assert_eq!(parse(&record).unwrap().get(1).unwrap().caption, "second");
    }

    #[test]
    fn enter_commits() {
        let (mut store, mut viewer, ids) = setup(&["A"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[0]).unwrap();
        editor.set_text("x");
        assert!(editor.handle_key(Key::Other, &mut store, &mut viewer).unwrap().is_none());
        assert!(editor.handle_key(Key::Enter, &mut store, &mut viewer).unwrap().is_some());
        assert_eq!(store.collection().get(0).unwrap().caption, "x");
    }

    #[test]
    fn second_edit_commits_first() {
        let (mut store, mut viewer, ids) = setup(&["A", "B"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[0]).unwrap();
        editor.set_text("first");

        let previous = editor.begin(&mut store, &mut viewer, &ids[1]).unwrap();

        assert_eq!(previous.unwrap().id, ids[0]);
        assert_eq!(store.collection().get(0).unwrap().caption, "first");
        assert_eq!(editor.editing(), Some(ids[1].as_str()));
    }

    #[test]
    fn commit_refreshes_viewer_on_same_entry() {
        let (mut store, mut viewer, ids) = setup(&["A", "B"]);
        viewer.open(store.collection(), 1);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[1]).unwrap();
        editor.set_text("shown");
        editor.commit(&mut store, &mut viewer).unwrap();
        assert_eq!(viewer.slide().unwrap().caption, "shown");
    }

    #[test]
    fn empty_caption_falls_back_to_name() {
        let (mut store, mut viewer, ids) = setup(&["A"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[0]).unwrap();
        editor.set_text("");
        editor.commit(&mut store, &mut viewer).unwrap();
        let e = store.collection().get(0).unwrap();
        assert_eq!(e.caption, "");
        assert_eq!(e.display_caption(), "A");
    }

    #[test]
    fn removed_entry_drops_edit() {
        let (mut store, mut viewer, ids) = setup(&["A"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[0]).unwrap();
        store.remove_by_id(&ids[0]).unwrap();
        editor.entry_removed(&ids[0]);
        assert!(editor.commit(&mut store, &mut viewer).unwrap().is_none());
    }

    #[test]
    fn unknown_id_starts_nothing() {
        let (mut store, mut viewer, _) = setup(&["A"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, "nope").unwrap();
        assert_eq!(editor.editing(), None);
    }

    #[test]
    fn typing_respects_char_boundaries() {
        let (mut store, mut viewer, ids) = setup(&["A"]);
        let mut editor = CaptionEditor::new();
        editor.begin(&mut store, &mut viewer, &ids[0]).unwrap();
        editor.set_text("café");
        editor.type_text("!");
        assert_eq!(editor.active().unwrap().buffer, "café!");
    }
}
