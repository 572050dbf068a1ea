//! Types for the upload module.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog;

/// MIME type sent when nothing better is known.
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A local file selected for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Name sent to the backend (the final path component).
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

impl SourceFile {
    pub fn new(
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Describe a file on disk.
    ///
    /// When `mime_type` is `None` it is inferred from the extension through
    /// the format catalog.
    pub async fn from_path(path: &Path, mime_type: Option<String>) -> io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                )
            })?;

        let mime_type = mime_type.unwrap_or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(catalog::mime_type_for_extension)
                .unwrap_or(FALLBACK_MIME_TYPE)
                .to_string()
        });

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime_type,
            size: metadata.len(),
        })
    }
}

/// Upload progress for the file body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
    /// Whole percent, rounded down; 100 only once the upload is acknowledged.
    pub percentage: u8,
}

impl UploadProgress {
    pub fn new(loaded: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((loaded.min(total) as u128 * 100) / total as u128) as u8
        };
        Self {
            loaded,
            total,
            percentage,
        }
    }

    /// Nothing sent yet.
    pub fn start(total: u64) -> Self {
        Self::new(0, total)
    }

    /// Upload acknowledged by the backend.
    pub fn complete(total: u64) -> Self {
        Self {
            loaded: total,
            total,
            percentage: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_progress_percentage_rounds_down() {
        assert_eq!(UploadProgress::new(0, 1000).percentage, 0);
        assert_eq!(UploadProgress::new(333, 1000).percentage, 33);
        assert_eq!(UploadProgress::new(999, 1000).percentage, 99);
        assert_eq!(UploadProgress::new(1000, 1000).percentage, 100);
    }

    #[test]
    fn test_progress_empty_total() {
        assert_eq!(UploadProgress::start(0).percentage, 0);
        assert_eq!(UploadProgress::complete(0).percentage, 100);
    }

    #[test]
    fn test_progress_large_sizes_do_not_overflow() {
        let total = u64::MAX / 2;
        assert_eq!(UploadProgress::new(total / 2, total).percentage, 49);
    }

    #[tokio::test]
    async fn test_from_path_infers_mime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Holiday.JPG");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 128]).unwrap();

        let source = SourceFile::from_path(&path, None).await.unwrap();
        assert_eq!(source.file_name, "Holiday.JPG");
        assert_eq!(source.mime_type, "image/jpeg");
        assert_eq!(source.size, 128);
    }

    #[tokio::test]
    async fn test_from_path_explicit_mime_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let source = SourceFile::from_path(&path, Some("text/markdown".to_string()))
            .await
            .unwrap();
        assert_eq!(source.mime_type, "text/markdown");
    }

    #[tokio::test]
    async fn test_from_path_unknown_extension_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.xyz");
        std::fs::write(&path, b"data").unwrap();

        let source = SourceFile::from_path(&path, None).await.unwrap();
        assert_eq!(source.mime_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_from_path_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = SourceFile::from_path(dir.path(), None).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
