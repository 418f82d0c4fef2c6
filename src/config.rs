//! Gallery configuration.
//!
//! Handles loading, validating, and merging `pocket-gal.toml`. Stock
//! defaults are the base layer; a config file in the data directory
//! overrides any subset of them.
//!
//! ## Config File Location
//!
//! ```text
//! .pocket-gal/
//! ├── pocket-gal.toml         # Optional overrides
//! └── galleryImages.json      # The persisted collection
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! key = "galleryImages"       # Record key of the collection
//!
//! [ingest]
//! max_file_size = 10485760    # Bytes; larger files are excluded
//! summary_delay_ms = 2000     # How long the upload summary stays up
//! max_workers = 4             # Parallel read workers (omit for auto = CPU cores)
//!
//! [viewer]
//! double_click_ms = 300       # Window in which a second click is a double click
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::ingest::DEFAULT_MAX_FILE_SIZE;
use crate::store::DEFAULT_RECORD_KEY;

/// Name of the config file inside the data directory.
pub const CONFIG_FILENAME: &str = "pocket-gal.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `pocket-gal.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Where the collection is persisted.
    pub storage: StorageConfig,
    /// Ingestion limits and timing.
    pub ingest: IngestConfig,
    /// Viewer input timing.
    pub viewer: ViewerConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.key.is_empty() {
            return Err(ConfigError::Validation(
                "storage.key must not be empty".into(),
            ));
        }
        if self.ingest.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "ingest.max_file_size must be non-zero".into(),
            ));
        }
        if self.ingest.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "ingest.max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Record key the collection is stored under.
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_RECORD_KEY.to_string(),
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Largest accepted file, in bytes.
    pub max_file_size: u64,
    /// Milliseconds the batch summary is shown before the surface goes idle.
    pub summary_delay_ms: u64,
    /// Maximum number of parallel read workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            summary_delay_ms: 2000,
            max_workers: None,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &IngestConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Viewer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Click disambiguation window in milliseconds.
    pub double_click_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            double_click_ms: 300,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `pocket-gal.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if there is no config file.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the data directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pocket-gal.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pocket Gal Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the data directory (default: .pocket-gal/).
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Record key the collection is saved under. Letters, digits, '-' and '_'.
key = "galleryImages"

# ---------------------------------------------------------------------------
# Ingestion
# ---------------------------------------------------------------------------
[ingest]
# Largest accepted file in bytes. Bigger files are silently skipped.
max_file_size = 10485760

# How long the "Uploaded N image(s)" summary stays up, in milliseconds.
summary_delay_ms = 2000

# Maximum parallel file-read workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_workers = 4

# ---------------------------------------------------------------------------
# Viewer
# ---------------------------------------------------------------------------
[viewer]
# A second click within this many milliseconds is a double click.
double_click_ms = 300
"##
}
