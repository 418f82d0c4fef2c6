//! Full-screen viewer navigation.
//!
//! The viewer is a two-state machine:
//!
//! ```text
//!            open(i), collection non-empty
//!   Closed ─────────────────────────────────▶ Open { cursor: i }
//!     ▲                                          │  next: (i + 1) % len
//!     │          close / Escape                  │  prev: (i + len - 1) % len
//!     └──────────────────────────────────────────┘
//! ```
//!
//! While open, the viewer holds a [`Slide`]: a snapshot of the entry it is
//! showing. The snapshot is what a renderer draws. It is replaced on every
//! navigation and when the shown entry's caption is committed.
//!
//! Removing entries while open:
//! - if the displayed entry is removed, the viewer closes;
//! - otherwise the numeric cursor is kept as is, even if the removal
//!   shifted a different entry under it. A cursor that ends up past the
//!   end closes the viewer.
//!
//! Opening from the gallery goes through a [`ClickDisambiguator`]: a tile
//! click only opens the viewer once the double-click window has passed
//! without a second click.

use std::time::{Duration, Instant};

use crate::types::{Collection, ImageEntry};

/// What the viewer is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub id: String,
    pub src: String,
    pub caption: String,
}

impl Slide {
    fn of(entry: &ImageEntry) -> Self {
        Self {
            id: entry.id.clone(),
            src: entry.src.clone(),
            caption: entry.display_caption().to_string(),
        }
    }
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Enter,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum State {
    #[default]
    Closed,
    Open { cursor: usize, slide: Slide },
}

/// The viewer state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    state: State,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    pub fn cursor(&self) -> Option<usize> {
        match &self.state {
            State::Open { cursor, .. } => Some(*cursor),
            State::Closed => None,
        }
    }

    pub fn slide(&self) -> Option<&Slide> {
        match &self.state {
            State::Open { slide, .. } => Some(slide),
            State::Closed => None,
        }
    }

    /// Open on `index`. Refused on an empty collection or an out-of-range
    /// index.
    pub fn open(&mut self, collection: &Collection, index: usize) -> bool {
        self.show(collection, index)
    }

    /// Advance with wraparound. Only while open.
    pub fn next(&mut self, collection: &Collection) -> bool {
        let Some(cursor) = self.cursor() else {
            return false;
        };
        if collection.is_empty() {
            return self.close();
        }
        self.show(collection, (cursor + 1) % collection.len())
    }

    /// Step back with wraparound. Only while open.
    pub fn prev(&mut self, collection: &Collection) -> bool {
        let Some(cursor) = self.cursor() else {
            return false;
        };
        if collection.is_empty() {
            return self.close();
        }
        let len = collection.len();
        self.show(collection, (cursor % len + len - 1) % len)
    }

    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = State::Closed;
        was_open
    }

    /// Keyboard bindings; ignored while closed. Returns whether the key was
    /// handled.
    pub fn handle_key(&mut self, key: Key, collection: &Collection) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::Escape => self.close(),
            Key::ArrowRight => self.next(collection),
            Key::ArrowLeft => self.prev(collection),
            Key::Enter | Key::Other => false,
        }
    }

    /// Re-snapshot the slide if the cursor points at `entry`.
    pub fn refresh(&mut self, collection: &Collection, entry_id: &str) {
        if let State::Open { cursor, slide } = &mut self.state {
            match collection.get(*cursor) {
                Some(entry) if entry.id == entry_id => *slide = Slide::of(entry),
                _ => {}
            }
        }
    }

    /// React to the removal of entry `removed_id` from `collection` (which
    /// no longer contains it).
    pub fn entry_removed(&mut self, collection: &Collection, removed_id: &str) {
        let close = match &self.state {
            State::Open { cursor, slide } => slide.id == removed_id || *cursor >= collection.len(),
            State::Closed => false,
        };
        if close {
            self.state = State::Closed;
        }
    }

    fn show(&mut self, collection: &Collection, index: usize) -> bool {
        match collection.get(index) {
            Some(entry) => {
                self.state = State::Open {
                    cursor: index,
                    slide: Slide::of(entry),
                };
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// Click disambiguation
// =============================================================================

/// Part of a tile that was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The image area: participates in single/double click detection.
    Image,
    Caption,
    Delete,
    Insert,
}

/// Immediate result of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not a viewer gesture (caption, delete or insert control).
    Ignored,
    /// Waiting to see whether a second click follows.
    Pending,
    /// Second click inside the window; carries the first click's index.
    Double(usize),
}

/// Tells single clicks from double clicks using a fixed window.
///
/// A first click starts the window. A second click inside it turns both
/// into a double click, which goes to the optional double-click handler.
/// If the window passes without a second click, [`poll`](Self::poll)
/// yields the single click.
pub struct ClickDisambiguator {
    window: Duration,
    pending: Option<(usize, Instant)>,
    ready: Option<usize>,
    on_double: Option<Box<dyn FnMut(usize)>>,
}

impl ClickDisambiguator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            ready: None,
            on_double: None,
        }
    }

    /// Install a double-click handler. Without one, double clicks do
    /// nothing beyond cancelling the single click.
    pub fn on_double_click(&mut self, handler: impl FnMut(usize) + 'static) {
        self.on_double = Some(Box::new(handler));
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn click(&mut self, index: usize, target: ClickTarget, now: Instant) -> ClickOutcome {
        if target != ClickTarget::Image {
            return ClickOutcome::Ignored;
        }
        match self.pending.take() {
            Some((first, at)) if now.duration_since(at) < self.window => {
                if let Some(handler) = self.on_double.as_mut() {
                    handler(first);
                }
                ClickOutcome::Double(first)
            }
            Some((expired, _)) => {
                self.ready = Some(expired);
                self.pending = Some((index, now));
                ClickOutcome::Pending
            }
            None => {
                self.pending = Some((index, now));
                ClickOutcome::Pending
            }
        }
    }

    /// The single click whose window has passed, if any.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        if let Some(index) = self.ready.take() {
            return Some(index);
        }
        match self.pending {
            Some((index, at)) if now.duration_since(at) >= self.window => {
                self.pending = None;
                Some(index)
            }
            _ => None,
        }
    }

    /// When the pending click will fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at + self.window)
    }
}
