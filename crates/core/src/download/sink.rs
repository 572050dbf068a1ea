//! Destinations for downloaded artifacts.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use super::types::SavedArtifact;

/// Receives the bytes of a finished artifact.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    fn name(&self) -> &str;

    /// Store `data` under `file_name`.
    async fn save(&self, file_name: &str, data: Bytes) -> io::Result<SavedArtifact>;
}

/// Writes artifacts into a directory.
///
/// Data goes to a hidden `.part` file first and is renamed into place, so a
/// failed save never leaves a truncated file under the final name.
pub struct FsArtifactSink {
    dir: PathBuf,
}

impl FsArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Removes the partial file unless disarmed.
struct PartialFileGuard {
    path: Option<PathBuf>,
}

impl PartialFileGuard {
    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove partial file");
                }
            }
        }
    }
}

/// Keep only the final path component so names cannot escape the directory.
fn sanitize(file_name: &str) -> io::Result<&str> {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    if name.is_empty() || name == "." || name == ".." {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid artifact name: {:?}", file_name),
        ));
    }
    Ok(name)
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn save(&self, file_name: &str, data: Bytes) -> io::Result<SavedArtifact> {
        let name = sanitize(file_name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let final_path = self.dir.join(name);
        let part_path = self.dir.join(format!(".{}.part", name));
        let mut guard = PartialFileGuard {
            path: Some(part_path.clone()),
        };

        tokio::fs::write(&part_path, &data).await?;
        tokio::fs::rename(&part_path, &final_path).await?;
        guard.disarm();

        debug!(path = %final_path.display(), size = data.len(), "Artifact saved");

        Ok(SavedArtifact {
            file_name: name.to_string(),
            location: final_path,
            size_bytes: data.len() as u64,
        })
    }
}
