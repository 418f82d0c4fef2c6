//! Shared test utilities for the pocket-gal test suite.
//!
//! Builders for entries and collections, order extractors, and mock
//! implementations of the ingestion, rendering and prompting seams.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut c = collection(&["A", "B", "C"]);
//! c.move_index(0, 2);
//! assert_eq!(names(&c), ["B", "C", "A"]);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use crate::gallery::{GalleryView, Prompter, Renderer};
use crate::ingest::{IngestError, LocalFile, SourceReader, UrlProbe};
use crate::types::{Collection, ImageEntry};

// =========================================================================
// Builders
// =========================================================================

/// An entry whose name, caption and src are derived from `name`.
pub fn entry(name: &str) -> ImageEntry {
    ImageEntry::new(format!("data:image/png;base64,{name}"), name, "1 Bytes")
}

/// A collection of fresh entries, one per name, in order.
pub fn collection(names: &[&str]) -> Collection {
    Collection::from_entries(names.iter().map(|n| entry(n)).collect()).unwrap()
}

/// A local image candidate that does not need to exist on disk.
pub fn local_png(filename: &str, size: u64) -> LocalFile {
    LocalFile {
        path: PathBuf::from("/virtual").join(filename),
        filename: filename.to_string(),
        mime: "image/png".to_string(),
        size,
    }
}

// =========================================================================
// Extractors
// =========================================================================

/// Entry names in collection order.
pub fn names(c: &Collection) -> Vec<&str> {
    c.iter().map(|e| e.name.as_str()).collect()
}

/// Entry ids in collection order.
pub fn ids(c: &Collection) -> Vec<String> {
    c.iter().map(|e| e.id.clone()).collect()
}

// =========================================================================
// Mocks
// =========================================================================

/// Reader that serves canned bytes per filename, optionally after a delay,
/// and fails for filenames it has no bytes for.
///
/// Uses Mutex so it is Sync and works with rayon's par_iter.
#[derive(Default)]
pub struct MockReader {
    pub delays: HashMap<String, Duration>,
    pub failing: Vec<String>,
    pub reads: Mutex<Vec<String>>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay each named file's read, making completion order differ from
    /// submission order.
    pub fn with_delays(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(n, ms)| (n.to_string(), Duration::from_millis(*ms)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing(mut self, filename: &str) -> Self {
        self.failing.push(filename.to_string());
        self
    }

    /// Filenames in the order their reads completed.
    pub fn completion_order(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl SourceReader for MockReader {
    fn read(&self, file: &LocalFile) -> Result<Vec<u8>, IngestError> {
        if let Some(delay) = self.delays.get(&file.filename) {
            std::thread::sleep(*delay);
        }
        self.reads.lock().unwrap().push(file.filename.clone());
        if self.failing.contains(&file.filename) {
            return Err(IngestError::Read {
                path: file.path.clone(),
                source: std::io::Error::other("mock read failure"),
            });
        }
        Ok(file.filename.as_bytes().to_vec())
    }
}

/// URL probe answering from a fixed allow list.
#[derive(Default)]
pub struct MockProbe {
    pub images: Vec<String>,
    pub probed: Mutex<Vec<String>>,
}

impl MockProbe {
    pub fn accepting(urls: &[&str]) -> Self {
        Self {
            images: urls.iter().map(|u| u.to_string()).collect(),
            probed: Mutex::new(Vec::new()),
        }
    }
}

impl UrlProbe for MockProbe {
    fn probe(&self, url: &str) -> Result<(), IngestError> {
        self.probed.lock().unwrap().push(url.to_string());
        if self.images.iter().any(|u| u == url) {
            Ok(())
        } else {
            Err(IngestError::NotAnImage(url.to_string()))
        }
    }
}

/// What one render call showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub captions: Vec<String>,
    pub cursor: Option<usize>,
    pub slide_caption: Option<String>,
    pub editing: Option<String>,
    pub dragging: Option<String>,
}

/// Renderer that keeps every frame. Clones share the frame list, so a
/// test keeps one clone and hands the other to the gallery.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub frames: Rc<RefCell<Vec<Frame>>>,
}

impl RecordingRenderer {
    pub fn count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn last(&self) -> Option<Frame> {
        self.frames.borrow().last().cloned()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &GalleryView<'_>) {
        self.frames.borrow_mut().push(Frame {
            captions: view
                .collection
                .iter()
                .map(|e| e.display_caption().to_string())
                .collect(),
            cursor: view.viewer.map(|(cursor, _)| cursor),
            slide_caption: view.viewer.map(|(_, slide)| slide.caption.clone()),
            editing: view.editing.map(|edit| edit.id.clone()),
            dragging: view.dragging.map(str::to_string),
        });
    }
}

/// Prompter with canned answers that logs every question.
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    pub confirm_answer: Rc<Cell<bool>>,
    pub answers: Rc<RefCell<VecDeque<String>>>,
    pub asked: Rc<RefCell<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn set_confirm(&self, answer: bool) {
        self.confirm_answer.set(answer);
    }

    /// Queue the reply to the next `ask`.
    pub fn answer(&self, text: &str) {
        self.answers.borrow_mut().push_back(text.to_string());
    }

    pub fn log(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str) -> bool {
        self.asked.borrow_mut().push(format!("confirm: {message}"));
        self.confirm_answer.get()
    }

    fn ask(&mut self, message: &str) -> Option<String> {
        self.asked.borrow_mut().push(format!("ask: {message}"));
        self.answers.borrow_mut().pop_front()
    }

    fn alert(&mut self, message: &str) {
        self.asked.borrow_mut().push(format!("alert: {message}"));
    }
}
