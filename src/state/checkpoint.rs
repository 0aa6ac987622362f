//! Checkpoint record and its on-disk form
//!
//! The checkpoint is pretty-printed JSON so it can be inspected, or edited by
//! hand to force a different resume point:
//!
//! ```json
//! {
//!   "last_page_index": 41,
//!   "last_page_url": "https://xkcd.com/41/"
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

/// File name of the checkpoint inside an output directory
pub const CHECKPOINT_FILENAME: &str = "DownloadState.json";

/// Largest page index a checkpoint may carry
///
/// Keeps the index inside the range JSON readers handle exactly and leaves
/// room to count further pages.
pub const MAX_PAGE_INDEX: u64 = i64::MAX as u64;

/// Durable resume point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Number of pages fully processed since the chain began
    #[serde(deserialize_with = "page_index")]
    pub last_page_index: u64,

    /// The last fully processed page
    ///
    /// Must be present in the file, `null` when no page is done yet.
    #[serde(deserialize_with = "required_url")]
    pub last_page_url: Option<Url>,
}

fn page_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let index = u64::deserialize(deserializer)?;
    if index > MAX_PAGE_INDEX {
        return Err(serde::de::Error::custom(format!(
            "last_page_index {} exceeds {}",
            index, MAX_PAGE_INDEX
        )));
    }
    Ok(index)
}

// A `deserialize_with` field is required even when it is an Option
fn required_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Url>, D::Error> {
    Option::<Url>::deserialize(deserializer)
}

impl Checkpoint {
    /// Records `page_url` as the next completed page
    pub fn advance(&mut self, page_url: Url) {
        self.last_page_index += 1;
        self.last_page_url = Some(page_url);
    }

    /// Index the next completed page will get
    pub fn next_index(&self) -> u64 {
        self.last_page_index + 1
    }
}

/// Errors reading or writing the checkpoint file
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Path of the checkpoint file for an output directory
pub fn checkpoint_path(dir: &Path) -> PathBuf {
    dir.join(CHECKPOINT_FILENAME)
}

/// Loads the checkpoint stored in `dir`
///
/// # Returns
///
/// * `Ok(Some(Checkpoint))` - A checkpoint was found and decoded
/// * `Ok(None)` - No checkpoint file exists yet
/// * `Err(CheckpointError::Malformed)` - The file does not decode into a checkpoint
pub fn load_checkpoint(dir: &Path) -> Result<Option<Checkpoint>, CheckpointError> {
    let path = checkpoint_path(dir);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(CheckpointError::Io { path, source }),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| CheckpointError::Malformed { path, source })
}

/// Persists `checkpoint` into `dir`, replacing any previous one
///
/// The record is written to a temporary file in the same directory, synced,
/// then renamed over the checkpoint, so readers only ever see a complete file.
/// This is blocking IO; async callers run it on the blocking pool.
pub fn save_checkpoint(dir: &Path, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
    let path = checkpoint_path(dir);
    let io_err = |source: std::io::Error| CheckpointError::Io {
        path: path.clone(),
        source,
    };

    let mut json = serde_json::to_string_pretty(checkpoint)
        .map_err(|source| CheckpointError::Malformed {
            path: path.clone(),
            source,
        })?;
    json.push('\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(&path).map_err(|e| io_err(e.error))?;
    sync_dir(dir).map_err(io_err)?;

    tracing::trace!(
        "Checkpoint saved: page {} at {}",
        checkpoint.last_page_index,
        path.display()
    );
    Ok(())
}

/// Flushes the directory entry so the rename itself survives a crash
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
