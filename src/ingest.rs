//! The ingestion pipeline: local files, folders and URLs into entries.
//!
//! ## Local files
//!
//! A batch goes through three steps:
//!
//! 1. **Filter**: only files whose MIME type is `image/*` and whose size is
//!    at most the configured limit (10 MiB by default) are kept. This
//!    happens before any read. An empty result is a validation failure and
//!    nothing else happens.
//! 2. **Read**: every kept file is read and encoded as a `data:` payload in
//!    parallel on the rayon pool. Reads complete in any order.
//! 3. **Merge**: the parallel map is collected by index, which is the
//!    barrier: the merge only starts once every read has settled, and the
//!    results are already in submission order. Failed reads are logged and
//!    dropped; the survivors are inserted as one contiguous run.
//!
//! The run lands at the pending insert position if one was set, otherwise
//! at the end. The pending position is consumed once per batch, never per
//! file, so a batch of three inserted "after tile 1" occupies positions 2,
//! 3 and 4 in submission order.
//!
//! ## URLs
//!
//! A URL is a batch of one. The [`UrlProbe`] must confirm the URL resolves
//! to an image; the entry is then appended (never position-inserted) with
//! placeholder name and size.
//!
//! ## Status
//!
//! Progress is reported as [`IngestEvent`]s over an optional channel:
//! `Busy` when a batch starts, `Summary` when it merged, and `Idle` once
//! the summary has been on display for the configured delay. The delay runs
//! on a detached thread and cannot be cancelled.
//!
//! ```text
//! files ──filter──▶ eligible ──par_iter read──▶ [Ok, Err, Ok] ──join──▶ run ──▶ store
//!                                                 (index order)
//! ```

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rayon::prelude::*;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

use crate::config::IngestConfig;
use crate::naming::{display_name, format_file_size, format_size_limit};
use crate::store::{CollectionStore, KeyValueStore, StoreError};
use crate::types::ImageEntry;

/// Largest file accepted by default: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Please select valid image files (JPEG, PNG, etc.) under {limit}")]
    NoEligibleFiles { limit: String },
    #[error("None of the {0} selected image(s) could be read")]
    AllReadsFailed(usize),
    #[error("Could not load image from this URL: {0}")]
    NotAnImage(String),
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Whether this is a user-facing validation failure rather than an
    /// operational error.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IngestError::NoEligibleFiles { .. }
                | IngestError::AllReadsFailed(_)
                | IngestError::NotAnImage(_)
        )
    }
}

// =============================================================================
// Sources
// =============================================================================

/// A local file offered for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// Original filename including extension.
    pub filename: String,
    /// MIME type, `application/octet-stream` when unknown.
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
}

impl LocalFile {
    /// Describe a file on disk. The MIME type comes from its extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            mime: mime_for_path(path),
            size: metadata.len(),
        })
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// MIME type for a path, looked up from the extension in the `image`
/// crate's format table.
pub fn mime_for_path(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MIME.to_string())
}

/// Describe each of `paths`, keeping their order.
///
/// A path that cannot be stat'ed is logged and skipped so the rest of the
/// batch still goes through.
pub fn local_files(paths: &[PathBuf]) -> Vec<LocalFile> {
    paths
        .iter()
        .filter_map(|path| match LocalFile::from_path(path) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Every regular file below `dir`, sorted by path.
///
/// Nothing is filtered here: the usual eligibility rules apply when the
/// result is ingested.
pub fn collect_folder(dir: &Path) -> Result<Vec<LocalFile>, IngestError> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(LocalFile::from_path(entry.path())?);
        }
    }
    Ok(files)
}

/// Keep the files that are images and at most `max_size` bytes.
pub fn eligible(files: Vec<LocalFile>, max_size: u64) -> Vec<LocalFile> {
    files
        .into_iter()
        .filter(|f| f.is_image() && f.size <= max_size)
        .collect()
}

/// Encode bytes as a `data:` URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Build the entry for a file whose contents have been read.
pub fn entry_for(file: &LocalFile, bytes: &[u8]) -> ImageEntry {
    ImageEntry::new(
        to_data_url(&file.mime, bytes),
        display_name(&file.filename),
        format_file_size(file.size),
    )
}

// =============================================================================
// Seams
// =============================================================================

/// Reads the contents of a local file.
///
/// Implementations must be `Sync`: reads of one batch run concurrently.
pub trait SourceReader: Sync {
    fn read(&self, file: &LocalFile) -> Result<Vec<u8>, IngestError>;
}

/// Reads from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, file: &LocalFile) -> Result<Vec<u8>, IngestError> {
        std::fs::read(&file.path).map_err(|source| IngestError::Read {
            path: file.path.clone(),
            source,
        })
    }
}

/// Confirms that a URL resolves to a loadable image.
pub trait UrlProbe: Sync {
    fn probe(&self, url: &str) -> Result<(), IngestError>;
}

/// Fetches the URL and checks that the body decodes as an image header.
#[derive(Debug, Clone, Default)]
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UrlProbe for HttpProbe {
    fn probe(&self, url: &str) -> Result<(), IngestError> {
        let bytes = self.client.get(url).send()?.error_for_status()?.bytes()?;
        let reader = image::ImageReader::new(Cursor::new(bytes.as_ref())).with_guessed_format()?;
        reader
            .into_dimensions()
            .map(|_| ())
            .map_err(|_| IngestError::NotAnImage(url.to_string()))
    }
}

// =============================================================================
// Status reporting
// =============================================================================

/// Progress of the ingestion surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// A batch of this many sources started.
    Busy { pending: usize },
    /// A batch finished and this many entries were added.
    Summary { ingested: usize },
    /// The surface is ready for the next batch.
    Idle,
}

/// Limits and timing of the pipeline.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub max_file_size: u64,
    pub summary_delay: Duration,
}

impl IngestSettings {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            summary_delay: Duration::from_millis(config.summary_delay_ms),
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

/// What a completed batch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of entries added.
    pub ingested: usize,
    /// Index of the first added entry.
    pub start_index: usize,
    /// Files excluded by the filter before reading.
    pub skipped: usize,
    /// Files whose read failed.
    pub failed: Vec<PathBuf>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// The ingestion pipeline with its reader and probe.
pub struct Ingestor<R: SourceReader, P: UrlProbe> {
    reader: R,
    probe: P,
    settings: IngestSettings,
    events: Option<Sender<IngestEvent>>,
}

impl Ingestor<FsReader, HttpProbe> {
    /// Filesystem reads and HTTP probing.
    pub fn standard(settings: IngestSettings) -> Self {
        Self::new(FsReader, HttpProbe::new(), settings)
    }
}

impl<R: SourceReader, P: UrlProbe> Ingestor<R, P> {
    pub fn new(reader: R, probe: P, settings: IngestSettings) -> Self {
        Self {
            reader,
            probe,
            settings,
            events: None,
        }
    }

    /// Report status events on `tx`.
    pub fn with_events(mut self, tx: Sender<IngestEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Ingest a batch of local files.
    ///
    /// `pending` is the pending insert position. It is taken as soon as the
    /// batch passes the filter, whatever the outcome of the reads.
    pub fn ingest_files<S: KeyValueStore>(
        &self,
        store: &mut CollectionStore<S>,
        files: Vec<LocalFile>,
        pending: &mut Option<usize>,
    ) -> Result<IngestReport, IngestError> {
        let offered = files.len();
        let batch = eligible(files, self.settings.max_file_size);
        if batch.is_empty() {
            return Err(IngestError::NoEligibleFiles {
                limit: format_size_limit(self.settings.max_file_size),
            });
        }
        let skipped = offered - batch.len();
        let position = pending.take();

        self.emit(IngestEvent::Busy {
            pending: batch.len(),
        });

        let results: Vec<Result<ImageEntry, IngestError>> = batch
            .par_iter()
            .map(|file| {
                self.reader
                    .read(file)
                    .map(|bytes| entry_for(file, &bytes))
            })
            .collect();

        let mut run = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (file, result) in batch.iter().zip(results) {
            match result {
                Ok(entry) => run.push(entry),
                Err(e) => {
                    log::warn!("error reading file {}: {}", file.filename, e);
                    failed.push(file.path.clone());
                }
            }
        }

        if run.is_empty() {
            self.emit(IngestEvent::Idle);
            return Err(IngestError::AllReadsFailed(batch.len()));
        }

        let start_index = position
            .unwrap_or(store.collection().len())
            .min(store.collection().len());
        let ingested = match store.insert_run_at(start_index, run) {
            Ok(n) => n,
            Err(e) => {
                self.emit(IngestEvent::Idle);
                return Err(e.into());
            }
        };

        log::info!(
            "ingested {} image(s) at index {} ({} skipped, {} failed)",
            ingested,
            start_index,
            skipped,
            failed.len()
        );
        self.finish(ingested);

        Ok(IngestReport {
            ingested,
            start_index,
            skipped,
            failed,
        })
    }

    /// Ingest a single image URL. Always appends.
    pub fn ingest_url<S: KeyValueStore>(
        &self,
        store: &mut CollectionStore<S>,
        url: &str,
    ) -> Result<IngestReport, IngestError> {
        self.emit(IngestEvent::Busy { pending: 1 });

        if let Err(e) = self.probe.probe(url) {
            log::warn!("url probe failed for {url}: {e}");
            self.emit(IngestEvent::Idle);
            return Err(IngestError::NotAnImage(url.to_string()));
        }

        let start_index = store.collection().len();
        if let Err(e) = store.append(ImageEntry::from_url(url)) {
            self.emit(IngestEvent::Idle);
            return Err(e.into());
        }
        self.finish(1);

        Ok(IngestReport {
            ingested: 1,
            start_index,
            skipped: 0,
            failed: Vec::new(),
        })
    }

    fn emit(&self, event: IngestEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }

    /// Report the summary, then go idle once the display delay has passed.
    fn finish(&self, ingested: usize) {
        self.emit(IngestEvent::Summary { ingested });
        let Some(tx) = self.events.clone() else {
            return;
        };
        let delay = self.settings.summary_delay;
        if delay.is_zero() {
            tx.send(IngestEvent::Idle).ok();
        } else {
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                tx.send(IngestEvent::Idle).ok();
            });
        }
    }
}
