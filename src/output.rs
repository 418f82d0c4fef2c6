//! Text output for the command line.
//!
//! # Information-First Display
//!
//! Every entry is shown by its positional index and display caption. The
//! id, size and source follow as indented context lines, so the listing
//! reads as an inventory while still giving the ids the other commands
//! take.
//!
//! # Output Format
//!
//! ## Gallery
//!
//! ```text
//! Gallery (2 images)
//! 001 Sunset
//!     Id: 6f1c0e6a9d2b4c53a1e0f7b8c9d0e1f2
//!     Size: 1.2 MB
//!     Source: data:image/jpeg (1638400 chars)
//! 002 Image from URL
//!     Id: 0a1b2c3d4e5f60718293a4b5c6d7e8f9
//!     Size: Unknown
//!     Source: https://example.com/cat.jpg
//! ```
//!
//! ## Viewer
//!
//! ```text
//! Viewing 002 of 005
//!     Sunset
//!     Source: data:image/jpeg (1638400 chars)
//!     [p] prev  [n] next  [q] close
//! ```
//!
//! ## Ingestion
//!
//! ```text
//! Uploading 3 images...
//! Successfully uploaded 3 images!
//! Added 3 images at 002
//!     Skipped: 1 (not an image or too large)
//!     Failed: broken.jpg
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper or [`TextRenderer`] that writes to
//! stdout. Format functions are pure.

use crate::gallery::{GalleryView, Renderer};
use crate::ingest::{IngestEvent, IngestReport};
use crate::types::{Collection, ImageEntry};
use crate::viewer::Slide;

/// Shown in place of the tiles when the gallery has no entries.
pub const EMPTY_GALLERY: &str = "Your gallery is empty. Upload some images to get started!";

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 0-based position as a 1-based 3-digit zero-padded index.
fn format_index(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 image`, `3 images`.
fn images(n: usize) -> String {
    if n == 1 {
        "1 image".to_string()
    } else {
        format!("{n} images")
    }
}

/// Short form of an entry source: inline payloads are summarised by MIME
/// type and length, URLs are shown as is.
fn describe_source(src: &str) -> String {
    match src.strip_prefix("data:") {
        Some(rest) => {
            let mime = rest.split([';', ',']).next().unwrap_or_default();
            format!("data:{} ({} chars)", mime, src.len())
        }
        None => src.to_string(),
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Format what the gallery shows: the viewer when it is open, the tile
/// listing otherwise.
pub fn format_gallery(view: &GalleryView<'_>) -> Vec<String> {
    match view.viewer {
        Some((cursor, slide)) => format_viewer(cursor, slide, view.collection.len()),
        None => format_collection(view),
    }
}

/// Format the tile listing with the interaction markers of `view`.
pub fn format_collection(view: &GalleryView<'_>) -> Vec<String> {
    let collection = view.collection;
    if collection.is_empty() {
        return vec![EMPTY_GALLERY.to_string()];
    }

    let mut lines = vec![format!("Gallery ({})", images(collection.len()))];
    for (index, entry) in collection.iter().enumerate() {
        lines.push(tile_header(index, entry, view));
        if let Some(edit) = view.editing.filter(|edit| edit.id == entry.id) {
            lines.push(format!("{}Editing: {}", indent(1), edit.buffer));
        }
        lines.push(format!("{}Id: {}", indent(1), entry.id));
        lines.push(format!("{}Size: {}", indent(1), entry.size));
        lines.push(format!("{}Source: {}", indent(1), describe_source(&entry.src)));
        if view.pending_insert == Some(index + 1) {
            lines.push(format!("{}(next upload lands here)", indent(1)));
        }
    }
    lines
}

fn tile_header(index: usize, entry: &ImageEntry, view: &GalleryView<'_>) -> String {
    let mut header = format!("{} {}", format_index(index), entry.display_caption());
    if view.dragging == Some(entry.id.as_str()) {
        header.push_str(" [dragging]");
    }
    if view.drop_target == Some(entry.id.as_str()) {
        header.push_str(" [drop here]");
    }
    header
}

/// Format the full-screen viewer.
pub fn format_viewer(cursor: usize, slide: &Slide, total: usize) -> Vec<String> {
    vec![
        format!("Viewing {} of {:0>3}", format_index(cursor), total),
        format!("{}{}", indent(1), slide.caption),
        format!("{}Source: {}", indent(1), describe_source(&slide.src)),
        format!("{}[p] prev  [n] next  [q] close", indent(1)),
    ]
}

/// Format a plain listing of `collection`.
pub fn format_listing(collection: &Collection) -> Vec<String> {
    format_collection(&GalleryView {
        collection,
        viewer: None,
        editing: None,
        dragging: None,
        drop_target: None,
        pending_insert: None,
    })
}

/// Renders every frame to stdout.
#[derive(Debug, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&mut self, view: &GalleryView<'_>) {
        for line in format_gallery(view) {
            println!("{}", line);
        }
    }
}

// ============================================================================
// Ingestion
// ============================================================================

/// Format a single ingestion status event as display lines.
pub fn format_ingest_event(event: &IngestEvent) -> Vec<String> {
    match event {
        IngestEvent::Busy { pending } => vec![format!("Uploading {}...", images(*pending))],
        IngestEvent::Summary { ingested } => {
            vec![format!("Successfully uploaded {}!", images(*ingested))]
        }
        IngestEvent::Idle => Vec::new(),
    }
}

/// Format the outcome of a completed batch.
pub fn format_ingest_report(report: &IngestReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Added {} at {}",
        images(report.ingested),
        format_index(report.start_index)
    )];
    if report.skipped > 0 {
        lines.push(format!(
            "{}Skipped: {} (not an image or too large)",
            indent(1),
            report.skipped
        ));
    }
    for path in &report.failed {
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        lines.push(format!("{}Failed: {}", indent(1), name));
    }
    lines
}

pub fn print_ingest_report(report: &IngestReport) {
    for line in format_ingest_report(report) {
        println!("{}", line);
    }
}
