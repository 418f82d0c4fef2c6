//! The gallery facade.
//!
//! [`Gallery`] owns the persisted collection and every piece of interaction
//! state around it: the pending insert position, the drag session, the
//! caption editor, the viewer and the click disambiguator. User gestures
//! come in as method calls; every call that changes what is on screen ends
//! by handing a [`GalleryView`] to the [`Renderer`].
//!
//! Questions to the user (confirm a delete, ask for a URL, report a
//! validation failure) go through the [`Prompter`].
//!
//! ```text
//!   gesture ──▶ Gallery ──▶ CollectionStore ──▶ KeyValueStore
//!                  │
//!                  └──▶ Renderer::render(&GalleryView)
//! ```

use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::caption::{CaptionEdit, CaptionEditor, Committed};
use crate::config::{self, ConfigError, GalleryConfig};
use crate::ingest::{
    self, FsReader, HttpProbe, IngestError, IngestEvent, IngestReport, IngestSettings, Ingestor,
    LocalFile, SourceReader, UrlProbe,
};
use crate::reorder::{DragSession, DropOutcome};
use crate::store::{CollectionStore, FileStore, KeyValueStore, StoreError};
use crate::types::{Collection, ImageEntry};
use crate::viewer::{ClickDisambiguator, ClickOutcome, ClickTarget, Key, Slide, Viewer};

/// Default single/double click window.
pub const DEFAULT_CLICK_WINDOW: Duration = Duration::from_millis(300);

/// Alert shown when a URL does not resolve to an image.
pub const URL_REJECTED: &str = "Could not load image from this URL";

/// Prompt used to ask for an image URL.
pub const URL_PROMPT: &str = "Enter image URL:";

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// What a renderer draws.
#[derive(Debug, Clone, Copy)]
pub struct GalleryView<'a> {
    pub collection: &'a Collection,
    /// Cursor and slide when the viewer is open.
    pub viewer: Option<(usize, &'a Slide)>,
    pub editing: Option<&'a CaptionEdit>,
    pub dragging: Option<&'a str>,
    pub drop_target: Option<&'a str>,
    pub pending_insert: Option<usize>,
}

/// Draws the gallery. Called after every visible change.
pub trait Renderer {
    fn render(&mut self, view: &GalleryView<'_>);
}

/// Modal questions to the user.
pub trait Prompter {
    fn confirm(&mut self, message: &str) -> bool;
    fn ask(&mut self, message: &str) -> Option<String>;
    fn alert(&mut self, message: &str);
}

/// Text of the delete confirmation for `entry`.
pub fn delete_prompt(entry: &ImageEntry) -> String {
    format!("Delete \"{}\"?", entry.display_caption())
}

/// The alert for an ingestion failure, if it is one the user should see.
pub fn alert_for(error: &IngestError) -> Option<String> {
    match error {
        IngestError::NoEligibleFiles { .. } | IngestError::AllReadsFailed(_) => {
            Some(error.to_string())
        }
        IngestError::NotAnImage(_) => Some(URL_REJECTED.to_string()),
        _ => None,
    }
}

pub struct Gallery<S: KeyValueStore, R: SourceReader, P: UrlProbe> {
    store: CollectionStore<S>,
    ingestor: Ingestor<R, P>,
    pending_insert: Option<usize>,
    drag: DragSession,
    captions: CaptionEditor,
    viewer: Viewer,
    clicks: ClickDisambiguator,
    renderer: Box<dyn Renderer>,
    prompter: Box<dyn Prompter>,
}

impl Gallery<FileStore, FsReader, HttpProbe> {
    /// Open the gallery persisted in `data_dir`, configured by the
    /// `pocket-gal.toml` found there.
    pub fn open(
        data_dir: &Path,
        renderer: Box<dyn Renderer>,
        prompter: Box<dyn Prompter>,
        events: Option<Sender<IngestEvent>>,
    ) -> Result<(Self, GalleryConfig), GalleryError> {
        let config = config::load_config(data_dir)?;
        let store = CollectionStore::open(FileStore::new(data_dir), config.storage.key.clone())?;
        let mut ingestor = Ingestor::standard(IngestSettings::from_config(&config.ingest));
        if let Some(tx) = events {
            ingestor = ingestor.with_events(tx);
        }
        let gallery = Gallery::new(store, ingestor, renderer, prompter)
            .with_click_window(Duration::from_millis(config.viewer.double_click_ms));
        Ok((gallery, config))
    }
}

impl<S: KeyValueStore, R: SourceReader, P: UrlProbe> Gallery<S, R, P> {
    pub fn new(
        store: CollectionStore<S>,
        ingestor: Ingestor<R, P>,
        renderer: Box<dyn Renderer>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            store,
            ingestor,
            pending_insert: None,
            drag: DragSession::new(),
            captions: CaptionEditor::new(),
            viewer: Viewer::new(),
            clicks: ClickDisambiguator::new(DEFAULT_CLICK_WINDOW),
            renderer,
            prompter,
        }
    }

    pub fn with_click_window(mut self, window: Duration) -> Self {
        self.clicks = ClickDisambiguator::new(window);
        self
    }

    /// Install a handler for double clicks on tile images.
    pub fn on_double_click(&mut self, handler: impl FnMut(usize) + 'static) {
        self.clicks.on_double_click(handler);
    }

    pub fn collection(&self) -> &Collection {
        self.store.collection()
    }

    pub fn store(&self) -> &CollectionStore<S> {
        &self.store
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn captions(&self) -> &CaptionEditor {
        &self.captions
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn pending_insert(&self) -> Option<usize> {
        self.pending_insert
    }

    /// Draw the current state.
    pub fn render(&mut self) {
        let view = GalleryView {
            collection: self.store.collection(),
            viewer: self.viewer.cursor().zip(self.viewer.slide()),
            editing: self.captions.active(),
            dragging: self.drag.dragged(),
            drop_target: self.drag.over(),
            pending_insert: self.pending_insert,
        };
        self.renderer.render(&view);
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Add a batch of local files at the pending insert position, or at the
    /// end. Validation failures are reported through the prompter and
    /// yield `Ok(None)`.
    pub fn add_files(&mut self, files: Vec<LocalFile>) -> Result<Option<IngestReport>, GalleryError> {
        let result = self
            .ingestor
            .ingest_files(&mut self.store, files, &mut self.pending_insert);
        self.settle(result)
    }

    /// Add every file under `dir` as one batch.
    pub fn add_folder(&mut self, dir: &Path) -> Result<Option<IngestReport>, GalleryError> {
        let files = ingest::collect_folder(dir)?;
        self.add_files(files)
    }

    /// Append the image at `url`.
    pub fn add_url(&mut self, url: &str) -> Result<Option<IngestReport>, GalleryError> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }
        let result = self.ingestor.ingest_url(&mut self.store, url);
        self.settle(result)
    }

    /// Ask the user for a URL and add it.
    pub fn prompt_url(&mut self) -> Result<Option<IngestReport>, GalleryError> {
        match self.prompter.ask(URL_PROMPT) {
            Some(url) => self.add_url(&url),
            None => Ok(None),
        }
    }

    /// Capture from a camera. No capture backend exists.
    pub fn camera_upload(&mut self) -> Result<Option<IngestReport>, GalleryError> {
        Err(GalleryError::Unsupported("camera capture"))
    }

    /// Make the next local batch land right after tile `index`.
    pub fn request_insert_after(&mut self, index: usize) -> bool {
        if index >= self.store.collection().len() {
            return false;
        }
        self.pending_insert = Some(index + 1);
        self.render();
        true
    }

    fn settle(
        &mut self,
        result: Result<IngestReport, IngestError>,
    ) -> Result<Option<IngestReport>, GalleryError> {
        match result {
            Ok(report) => {
                self.render();
                Ok(Some(report))
            }
            Err(e) if e.is_validation() => {
                if let Some(message) = alert_for(&e) {
                    self.prompter.alert(&message);
                }
                self.render();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete entry `id` after the user confirms.
    pub fn delete(&mut self, id: &str) -> Result<bool, GalleryError> {
        let Some(entry) = self.store.collection().find(id) else {
            return Ok(false);
        };
        if !self.prompter.confirm(&delete_prompt(entry)) {
            return Ok(false);
        }
        let Some((index, removed)) = self.store.remove_by_id(id)? else {
            return Ok(false);
        };
        log::debug!("deleted entry {} at index {}", removed.id, index);

        self.captions.entry_removed(id);
        self.viewer.entry_removed(self.store.collection(), id);
        if self.drag.dragged() == Some(id) {
            self.drag.cancel();
        } else {
            self.drag.leave(id);
        }
        self.render();
        Ok(true)
    }

    // =========================================================================
    // Reorder
    // =========================================================================

    pub fn drag_start(&mut self, id: &str) {
        if self.store.collection().contains(id) {
            self.drag.start(id);
            self.render();
        }
    }

    pub fn drag_enter(&mut self, id: &str) {
        self.drag.enter(id);
        self.render();
    }

    pub fn drag_leave(&mut self, id: &str) {
        self.drag.leave(id);
        self.render();
    }

    /// The drag ended outside any tile.
    pub fn drag_cancel(&mut self) {
        if self.drag.cancel().is_some() {
            self.render();
        }
    }

    pub fn drop_on(&mut self, target_id: &str) -> Result<DropOutcome, GalleryError> {
        let outcome = self.drag.drop_on(&mut self.store, target_id)?;
        self.render();
        Ok(outcome)
    }

    /// Move `dragged_id` onto `target_id` in one gesture.
    pub fn move_entry(&mut self, dragged_id: &str, target_id: &str) -> Result<DropOutcome, GalleryError> {
        self.drag.start(dragged_id);
        self.drop_on(target_id)
    }

    // =========================================================================
    // Captions
    // =========================================================================

    pub fn begin_caption(&mut self, id: &str) -> Result<Option<Committed>, GalleryError> {
        let previous = self.captions.begin(&mut self.store, &mut self.viewer, id)?;
        self.render();
        Ok(previous)
    }

    pub fn type_caption(&mut self, text: &str) {
        if self.captions.active().is_some() {
            self.captions.type_text(text);
            self.render();
        }
    }

    pub fn set_caption_text(&mut self, text: &str) {
        if self.captions.active().is_some() {
            self.captions.set_text(text);
            self.render();
        }
    }

    /// The caption field lost focus.
    pub fn commit_caption(&mut self) -> Result<Option<Committed>, GalleryError> {
        let done = self.captions.commit(&mut self.store, &mut self.viewer)?;
        if done.is_some() {
            self.render();
        }
        Ok(done)
    }

    /// Set entry `id`'s caption in one step.
    pub fn caption(&mut self, id: &str, text: &str) -> Result<Option<Committed>, GalleryError> {
        self.captions.begin(&mut self.store, &mut self.viewer, id)?;
        if self.captions.editing() != Some(id) {
            return Ok(None);
        }
        self.captions.set_text(text);
        self.commit_caption()
    }

    // =========================================================================
    // Viewer
    // =========================================================================

    pub fn open_viewer(&mut self, index: usize) -> bool {
        let opened = self.viewer.open(self.store.collection(), index);
        if opened {
            self.render();
        }
        opened
    }

    pub fn next(&mut self) -> bool {
        let moved = self.viewer.next(self.store.collection());
        if moved {
            self.render();
        }
        moved
    }

    pub fn prev(&mut self) -> bool {
        let moved = self.viewer.prev(self.store.collection());
        if moved {
            self.render();
        }
        moved
    }

    pub fn close_viewer(&mut self) -> bool {
        let closed = self.viewer.close();
        if closed {
            self.render();
        }
        closed
    }

    /// Keyboard input. Enter commits a caption edit; the arrows and Escape
    /// drive the viewer while it is open.
    pub fn key(&mut self, key: Key) -> Result<bool, GalleryError> {
        if self.captions.active().is_some() {
            let done = self
                .captions
                .handle_key(key, &mut self.store, &mut self.viewer)?;
            if done.is_some() {
                self.render();
                return Ok(true);
            }
        }
        let handled = self.viewer.handle_key(key, self.store.collection());
        if handled {
            self.render();
        }
        Ok(handled)
    }

    // =========================================================================
    // Tile clicks
    // =========================================================================

    /// A click on part of tile `index`.
    ///
    /// Image clicks go through the double-click window and open the viewer
    /// from [`tick`](Self::tick). The controls act immediately.
    pub fn tile_click(
        &mut self,
        index: usize,
        target: ClickTarget,
        now: Instant,
    ) -> Result<ClickOutcome, GalleryError> {
        let Some(id) = self.store.collection().get(index).map(|e| e.id.clone()) else {
            return Ok(ClickOutcome::Ignored);
        };
        match target {
            ClickTarget::Image => Ok(self.clicks.click(index, target, now)),
            ClickTarget::Caption => {
                self.begin_caption(&id)?;
                Ok(ClickOutcome::Ignored)
            }
            ClickTarget::Delete => {
                self.delete(&id)?;
                Ok(ClickOutcome::Ignored)
            }
            ClickTarget::Insert => {
                self.request_insert_after(index);
                Ok(ClickOutcome::Ignored)
            }
        }
    }

    /// Fire single clicks whose window has passed. Returns whether the
    /// viewer opened.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut opened = false;
        while let Some(index) = self.clicks.poll(now) {
            opened |= self.viewer.open(self.store.collection(), index);
        }
        if opened {
            self.render();
        }
        opened
    }

    /// When the next pending click fires.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.clicks.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DEFAULT_RECORD_KEY, MemoryStore};
    use crate::test_helpers::*;

    type TestGallery = Gallery<MemoryStore, MockReader, MockProbe>;

    fn gallery_with(names: &[&str]) -> (TestGallery, RecordingRenderer, ScriptedPrompter) {
        gallery_with_probe(names, MockProbe::default())
    }

    fn gallery_with_probe(
        names: &[&str],
        probe: MockProbe,
    ) -> (TestGallery, RecordingRenderer, ScriptedPrompter) {
        let mut store = CollectionStore::open(MemoryStore::new(), DEFAULT_RECORD_KEY).unwrap();
        for n in names {
            store.append(entry(n)).unwrap();
        }
        let settings = IngestSettings {
            summary_delay: Duration::ZERO,
            ..IngestSettings::default()
        };
        let ingestor = Ingestor::new(MockReader::new(), probe, settings);
        let renderer = RecordingRenderer::default();
        let prompter = ScriptedPrompter::default();
        let gallery = Gallery::new(
            store,
            ingestor,
            Box::new(renderer.clone()),
            Box::new(prompter.clone()),
        );
        (gallery, renderer, prompter)
    }

    fn id_at(g: &TestGallery, index: usize) -> String {
        g.collection().get(index).unwrap().id.clone()
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    #[test]
    fn add_files_appends_and_renders() {
        let (mut g, renderer, _) = gallery_with(&["A"]);
        let report = g
            .add_files(vec![local_png("b.png", 10), local_png("c.png", 10)])
            .unwrap()
            .unwrap();
        assert_eq!(report.start_index, 1);
        assert_eq!(names(g.collection()), ["A", "b", "c"]);
        assert_eq!(renderer.last().unwrap().captions, ["A", "b", "c"]);
    }

    #[test]
    fn insert_after_places_batch_and_clears_position() {
        let (mut g, _, _) = gallery_with(&["A", "B", "C"]);
        assert!(g.request_insert_after(0));
        assert_eq!(g.pending_insert(), Some(1));

        g.add_files(vec![local_png("x.png", 1), local_png("y.png", 1)])
            .unwrap();

        assert_eq!(names(g.collection()), ["A", "x", "y", "B", "C"]);
        assert_eq!(g.pending_insert(), None);

        g.add_files(vec![local_png("z.png", 1)]).unwrap();
        assert_eq!(names(g.collection()), ["A", "x", "y", "B", "C", "z"]);
    }

    #[test]
    fn insert_after_out_of_range_is_refused() {
        let (mut g, _, _) = gallery_with(&["A"]);
        assert!(!g.request_insert_after(1));
        assert_eq!(g.pending_insert(), None);
    }

    #[test]
    fn rejected_batch_alerts_and_keeps_position() {
        let (mut g, _, prompter) = gallery_with(&["A", "B"]);
        g.request_insert_after(0);
        let mut doc = local_png("notes.txt", 10);
        doc.mime = "text/plain".to_string();

        assert!(g.add_files(vec![doc]).unwrap().is_none());

        assert_eq!(
            prompter.log(),
            ["alert: Please select valid image files (JPEG, PNG, etc.) under 10MB"]
        );
        assert_eq!(g.pending_insert(), Some(1));
        assert_eq!(g.collection().len(), 2);
    }

    #[test]
    fn batch_with_only_failed_reads_alerts() {
        let (mut g, renderer, prompter) = gallery_with(&["A"]);
        g.ingestor = Ingestor::new(
            MockReader::new().failing("broken.png"),
            MockProbe::default(),
            IngestSettings::default(),
        );

        assert!(g.add_files(vec![local_png("broken.png", 10)]).unwrap().is_none());

        assert_eq!(
            prompter.log(),
            ["alert: None of the 1 selected image(s) could be read"]
        );
        assert_eq!(names(g.collection()), ["A"]);
        assert_eq!(renderer.last().unwrap().captions, ["A"]);
    }

    #[test]
    fn url_is_appended_even_with_pending_position() {
        let probe = MockProbe::accepting(&["https://example.com/cat.jpg"]);
        let (mut g, _, _) = gallery_with_probe(&["A", "B"], probe);
        g.request_insert_after(0);

        g.add_url("https://example.com/cat.jpg").unwrap().unwrap();

        let last = g.collection().get(2).unwrap();
        assert_eq!(last.src, "https://example.com/cat.jpg");
        assert_eq!(last.name, "Image from URL");
        assert_eq!(last.size, "Unknown");
        assert_eq!(g.pending_insert(), Some(1));
    }

    #[test]
    fn bad_url_alerts() {
        let (mut g, _, prompter) = gallery_with(&[]);
        assert!(g.add_url("https://example.com/page.html").unwrap().is_none());
        assert_eq!(prompter.log(), ["alert: Could not load image from this URL"]);
        assert!(g.collection().is_empty());
    }

    #[test]
    fn prompt_url_uses_answer() {
        let probe = MockProbe::accepting(&["https://example.com/a.png"]);
        let (mut g, _, prompter) = gallery_with_probe(&[], probe);
        prompter.answer("https://example.com/a.png");
        g.prompt_url().unwrap().unwrap();
        assert_eq!(g.collection().len(), 1);
        assert_eq!(prompter.log()[0], "ask: Enter image URL:");
    }

    #[test]
    fn blank_url_is_ignored() {
        let (mut g, renderer, _) = gallery_with(&[]);
        assert!(g.add_url("   ").unwrap().is_none());
        assert_eq!(renderer.count(), 0);
    }

    #[test]
    fn camera_is_unsupported() {
        let (mut g, _, _) = gallery_with(&[]);
        assert!(matches!(
            g.camera_upload(),
            Err(GalleryError::Unsupported(_))
        ));
    }

    // =========================================================================
    // Delete
    // =========================================================================

    #[test]
    fn delete_asks_with_caption() {
        let (mut g, _, prompter) = gallery_with(&["A", "B"]);
        prompter.set_confirm(true);
        let id = id_at(&g, 1);
        g.caption(&id, "Beach").unwrap();

        assert!(g.delete(&id).unwrap());

        assert_eq!(prompter.log(), ["confirm: Delete \"Beach\"?"]);
        assert_eq!(names(g.collection()), ["A"]);
    }

    #[test]
    fn declined_delete_keeps_entry() {
        let (mut g, _, prompter) = gallery_with(&["A"]);
        prompter.set_confirm(false);
        let id = id_at(&g, 0);
        assert!(!g.delete(&id).unwrap());
        assert_eq!(g.collection().len(), 1);
    }

    #[test]
    fn deleting_shown_entry_closes_viewer() {
        let (mut g, renderer, prompter) = gallery_with(&["A", "B", "C"]);
        prompter.set_confirm(true);
        g.open_viewer(1);
        let id = id_at(&g, 1);

        g.delete(&id).unwrap();

        assert!(!g.viewer().is_open());
        assert_eq!(renderer.last().unwrap().cursor, None);
    }

    #[test]
    fn deleting_other_entry_keeps_cursor() {
        let (mut g, _, prompter) = gallery_with(&["A", "B", "C"]);
        prompter.set_confirm(true);
        g.open_viewer(1);
        let id = id_at(&g, 0);

        g.delete(&id).unwrap();

        assert_eq!(g.viewer().cursor(), Some(1));
        assert_eq!(g.viewer().slide().unwrap().caption, "B");
    }

    #[test]
    fn deleting_edited_entry_ends_edit() {
        let (mut g, _, prompter) = gallery_with(&["A", "B"]);
        prompter.set_confirm(true);
        let id = id_at(&g, 0);
        g.begin_caption(&id).unwrap();
        g.delete(&id).unwrap();
        assert_eq!(g.captions().editing(), None);
    }

    // =========================================================================
    // Reorder
    // =========================================================================

    #[test]
    fn drag_and_drop_moves_entry() {
        let (mut g, renderer, _) = gallery_with(&["A", "B", "C", "D"]);
        let a = id_at(&g, 0);
        let c = id_at(&g, 2);

        g.drag_start(&a);
        g.drag_enter(&c);
        assert_eq!(renderer.last().unwrap().dragging, Some(a.clone()));

        let outcome = g.drop_on(&c).unwrap();

        assert_eq!(outcome, DropOutcome::Moved { from: 0, to: 2 });
        assert_eq!(names(g.collection()), ["B", "C", "A", "D"]);
        assert_eq!(renderer.last().unwrap().dragging, None);
    }

    #[test]
    fn move_entry_backward() {
        let (mut g, _, _) = gallery_with(&["A", "B", "C", "D"]);
        let d = id_at(&g, 3);
        let a = id_at(&g, 0);
        g.move_entry(&d, &a).unwrap();
        assert_eq!(names(g.collection()), ["D", "A", "B", "C"]);
    }

    #[test]
    fn drag_of_unknown_id_does_not_start() {
        let (mut g, _, _) = gallery_with(&["A"]);
        g.drag_start("missing");
        assert!(!g.drag().is_active());
    }

    #[test]
    fn cancelled_drag_leaves_order_alone() {
        let (mut g, renderer, _) = gallery_with(&["A", "B", "C"]);
        let a = id_at(&g, 0);
        let b = id_at(&g, 1);

        g.drag_start(&a);
        g.drag_enter(&b);
        assert_eq!(g.drag().over(), Some(b.as_str()));
        g.drag_leave(&b);
        assert_eq!(g.drag().over(), None);
        assert!(g.drag().is_active());

        let before = renderer.count();
        g.drag_cancel();

        assert!(!g.drag().is_active());
        assert_eq!(renderer.count(), before + 1);
        assert_eq!(renderer.last().unwrap().dragging, None);
        assert_eq!(names(g.collection()), ["A", "B", "C"]);

        g.drag_cancel();
        assert_eq!(renderer.count(), before + 1);
    }

    // =========================================================================
    // Captions
    // =========================================================================

    #[test]
    fn caption_edit_commits_on_enter() {
        let (mut g, _, _) = gallery_with(&["A"]);
        let id = id_at(&g, 0);
        g.begin_caption(&id).unwrap();
        g.type_caption("Sunrise");
        assert!(g.key(Key::Enter).unwrap());
        assert_eq!(g.collection().get(0).unwrap().caption, "Sunrise");
    }

    #[test]
    fn caption_text_replaces_whole_buffer() {
        let (mut g, _, _) = gallery_with(&["A"]);
        let id = id_at(&g, 0);

        g.set_caption_text("ignored");
        assert_eq!(g.captions().active(), None);

        g.begin_caption(&id).unwrap();
        g.type_caption("Sun");
        g.set_caption_text("Harbour at dusk");
        assert_eq!(g.captions().active().unwrap().buffer, "Harbour at dusk");

        g.commit_caption().unwrap().unwrap();
        assert_eq!(g.collection().get(0).unwrap().caption, "Harbour at dusk");
    }

    #[test]
    fn caption_commit_refreshes_open_viewer() {
        let (mut g, renderer, _) = gallery_with(&["A", "B"]);
        g.open_viewer(0);
        let id = id_at(&g, 0);
        g.caption(&id, "Hello").unwrap();
        assert_eq!(g.viewer().slide().unwrap().caption, "Hello");
        assert_eq!(renderer.last().unwrap().slide_caption.as_deref(), Some("Hello"));
    }

    // =========================================================================
    // Viewer and clicks
    // =========================================================================

    #[test]
    fn keys_navigate_with_wraparound() {
        let (mut g, _, _) = gallery_with(&["A", "B", "C"]);
        g.open_viewer(2);
        g.key(Key::ArrowRight).unwrap();
        assert_eq!(g.viewer().cursor(), Some(0));
        g.key(Key::ArrowLeft).unwrap();
        assert_eq!(g.viewer().cursor(), Some(2));
        g.key(Key::Escape).unwrap();
        assert!(!g.viewer().is_open());
        assert!(!g.key(Key::ArrowRight).unwrap());
    }

    #[test]
    fn open_on_empty_gallery_is_refused() {
        let (mut g, renderer, _) = gallery_with(&[]);
        assert!(!g.open_viewer(0));
        assert_eq!(renderer.count(), 0);
    }

    #[test]
    fn single_click_opens_after_window() {
        let (mut g, _, _) = gallery_with(&["A", "B"]);
        let t0 = Instant::now();
        assert_eq!(
            g.tile_click(1, ClickTarget::Image, t0).unwrap(),
            ClickOutcome::Pending
        );
        assert!(!g.tick(t0 + Duration::from_millis(50)));
        assert!(g.tick(t0 + DEFAULT_CLICK_WINDOW));
        assert_eq!(g.viewer().cursor(), Some(1));
    }

    #[test]
    fn double_click_does_not_open() {
        let (mut g, _, _) = gallery_with(&["A"]);
        let t0 = Instant::now();
        g.tile_click(0, ClickTarget::Image, t0).unwrap();
        assert_eq!(
            g.tile_click(0, ClickTarget::Image, t0 + Duration::from_millis(100))
                .unwrap(),
            ClickOutcome::Double(0)
        );
        assert!(!g.tick(t0 + Duration::from_secs(1)));
        assert!(!g.viewer().is_open());
    }

    #[test]
    fn control_clicks_act_immediately() {
        let (mut g, _, prompter) = gallery_with(&["A", "B"]);
        prompter.set_confirm(true);
        let t0 = Instant::now();

        g.tile_click(0, ClickTarget::Insert, t0).unwrap();
        assert_eq!(g.pending_insert(), Some(1));

        g.tile_click(1, ClickTarget::Caption, t0).unwrap();
        assert_eq!(g.captions().editing(), Some(id_at(&g, 1).as_str()));

        g.tile_click(0, ClickTarget::Delete, t0).unwrap();
        assert_eq!(names(g.collection()), ["B"]);
        assert_eq!(g.next_deadline(), None);
    }
}
