//! Error types for artifact retrieval.

use thiserror::Error;

use crate::client::ClientError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The artifact arrived but could not be stored.
    #[error("Failed to save {file_name}: {source}")]
    Save {
        file_name: String,
        source: std::io::Error,
    },
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Client(ClientError::Cancelled))
    }
}
