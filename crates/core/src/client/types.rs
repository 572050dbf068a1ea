//! Wire types for the conversion backend.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use super::error::ClientError;
use crate::job::{JobCredentials, JobDescriptor, JobSnapshot, JobStatus};

/// Body of a successful `POST /api/upload`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,
    pub token: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub target_format: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for UploadResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadResponse")
            .field("job_id", &self.job_id)
            .field("token", &"<redacted>")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("file_size", &self.file_size)
            .field("target_format", &self.target_format)
            .finish()
    }
}

impl From<UploadResponse> for JobDescriptor {
    fn from(response: UploadResponse) -> Self {
        Self {
            credentials: JobCredentials::new(response.job_id, response.token),
            file_name: response.file_name,
            source_format: response.mime_type,
            file_size: response.file_size,
            target_format: response.target_format,
            created_at: response.created_at,
            expires_at: response.expires_at,
        }
    }
}

/// Body of `GET /api/jobs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub source_format: String,
    #[serde(default)]
    pub target_format: String,
    #[serde(default)]
    pub progress: i32,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl From<JobStatusResponse> for JobSnapshot {
    fn from(response: JobStatusResponse) -> Self {
        Self {
            job_id: response.job_id,
            status: response.status,
            progress: response.progress.clamp(0, 100) as u8,
            error_message: response.error_message,
            completed_at: response.completed_at,
            download_url: response.download_url,
        }
    }
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    pub timestamp: String,
}

/// Chunked artifact body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// An opened artifact download.
pub struct ArtifactResponse {
    /// Declared body length, when the backend sent one.
    pub content_length: Option<u64>,
    /// Readable body. `None` when the transport cannot stream it.
    pub body: Option<ByteStream>,
}

impl ArtifactResponse {
    pub fn from_bytes(data: Bytes) -> Self {
        let len = data.len() as u64;
        Self {
            content_length: Some(len),
            body: Some(Box::pin(futures::stream::once(async move { Ok(data) }))),
        }
    }
}

impl std::fmt::Debug for ArtifactResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactResponse")
            .field("content_length", &self.content_length)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
