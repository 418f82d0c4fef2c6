//! Display names and size labels for ingested images.
//!
//! Every entry carries two strings derived from the file it came from:
//!
//! - **Name**: the original filename with its last extension removed.
//!   `holiday.beach.jpg` → "holiday.beach", `scan.png` → "scan".
//!   The name doubles as the default caption.
//! - **Size**: a human-readable label with one decimal place, switching
//!   units at 1 KiB and 1 MiB: `512 Bytes`, `12.3 KB`, `4.0 MB`.
//!
//! Entries ingested from a URL have neither a filename nor a known size and
//! use [`URL_ENTRY_NAME`] and [`UNKNOWN_SIZE`] instead.

/// Name (and default caption) of entries created from a URL.
pub const URL_ENTRY_NAME: &str = "Image from URL";

/// Size label of entries created from a URL.
pub const UNKNOWN_SIZE: &str = "Unknown";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Strip the last extension from a filename.
///
/// Handles these patterns:
/// - `"dawn.jpg"` → `"dawn"`
/// - `"archive.tar.png"` → `"archive.tar"`
/// - `"README"` → `"README"` (no extension)
/// - `"trailing."` → `"trailing."` (empty extension is not an extension)
/// - `".png"` → `""` (the whole name is an extension)
pub fn display_name(filename: &str) -> String {
    match filename.rfind('.') {
        Some(dot) if dot + 1 < filename.len() && !filename[dot + 1..].contains('/') => {
            filename[..dot].to_string()
        }
        _ => filename.to_string(),
    }
}

/// Format an upload limit the way validation messages quote it.
///
/// Whole mebibytes are written compactly (`10MB`); anything else falls
/// back to [`format_file_size`].
pub fn format_size_limit(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format_file_size(bytes)
    }
}

/// Format a byte count as a short label.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{} Bytes", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}
