//! Types for artifact retrieval.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the artifact body is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadMode {
    /// Read chunk by chunk, reporting progress when the length is known.
    #[default]
    Streamed,
    /// Read the whole body at once, without progress.
    Buffered,
}

/// Bytes received so far against the declared total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl DownloadProgress {
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.loaded.min(self.total) as u128 * 100) / self.total as u128) as u8
    }
}

/// Where a saved artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    pub file_name: String,
    pub location: PathBuf,
    pub size_bytes: u64,
}
