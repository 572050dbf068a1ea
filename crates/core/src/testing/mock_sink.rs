//! In-memory artifact sink for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::download::{ArtifactSink, SavedArtifact};

/// Mock implementation of the ArtifactSink trait.
///
/// Keeps saved artifacts in memory, keyed by file name.
#[derive(Debug, Default)]
pub struct MockArtifactSink {
    saved: Arc<RwLock<HashMap<String, Bytes>>>,
    fail_next: Arc<RwLock<bool>>,
}

impl MockArtifactSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes saved under `file_name`, if any.
    pub async fn saved(&self, file_name: &str) -> Option<Bytes> {
        self.saved.read().await.get(file_name).cloned()
    }

    /// Names of everything saved so far.
    pub async fn saved_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.saved.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Make the next save fail with a permission error.
    pub async fn fail_next_save(&self) {
        *self.fail_next.write().await = true;
    }
}

#[async_trait]
impl ArtifactSink for MockArtifactSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn save(&self, file_name: &str, data: Bytes) -> io::Result<SavedArtifact> {
        {
            let mut fail = self.fail_next.write().await;
            if *fail {
                *fail = false;
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "mock sink refused the write",
                ));
            }
        }

        let size_bytes = data.len() as u64;
        self.saved.write().await.insert(file_name.to_string(), data);
        Ok(SavedArtifact {
            file_name: file_name.to_string(),
            location: PathBuf::from("memory").join(file_name),
            size_bytes,
        })
    }
}
