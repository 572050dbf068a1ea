//! Error types for the upload module.

use thiserror::Error;

use crate::catalog::format_file_size;
use crate::client::ClientError;

/// Input rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// File exceeds the configured size ceiling.
    #[error("File too large ({}). Maximum size is {}", human(.size), human(.max))]
    FileTooLarge { size: u64, max: u64 },

    #[error("No file selected")]
    MissingFile,

    #[error("No source format selected")]
    MissingSourceFormat,

    #[error("No target format selected")]
    MissingTargetFormat,

    /// The catalog does not list `target` for `source_format`.
    #[error("Cannot convert {source_format} to {target}")]
    UnsupportedTarget {
        source_format: String,
        target: String,
    },
}

fn human(bytes: &u64) -> String {
    format_file_size(*bytes)
}

/// Errors that can occur while uploading.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl UploadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Client(ClientError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_message() {
        let err = ValidationError::FileTooLarge {
            size: 600 * 1024 * 1024,
            max: 500 * 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "File too large (600 MB). Maximum size is 500 MB"
        );
    }

    #[test]
    fn test_upload_error_is_cancelled() {
        assert!(UploadError::Client(ClientError::Cancelled).is_cancelled());
        assert!(!UploadError::Validation(ValidationError::MissingFile).is_cancelled());
    }
}
