//! Backend trait definition.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::ClientError;
use super::types::{ArtifactResponse, JobStatusResponse, UploadResponse};
use crate::job::JobCredentials;
use crate::upload::{SourceFile, UploadProgress};

/// Operations the conversion service exposes.
///
/// Implementations should be cheap to share across tasks. Cancellation is
/// handled by the caller dropping the returned future.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Submit a file for conversion.
    ///
    /// Byte-level progress is pushed into `progress` while the body is sent.
    /// Implementations must not report `loaded == total`; full completion is
    /// signalled by the returned response.
    async fn upload(
        &self,
        file: &SourceFile,
        target_format: &str,
        progress: mpsc::Sender<UploadProgress>,
    ) -> Result<UploadResponse, ClientError>;

    /// Fetch the current status of a job.
    async fn job_status(&self, job: &JobCredentials) -> Result<JobStatusResponse, ClientError>;

    /// Open the converted artifact of a completed job.
    async fn download(&self, job: &JobCredentials) -> Result<ArtifactResponse, ClientError>;

    /// Ask the backend to delete a job and its files.
    async fn delete_job(&self, job: &JobCredentials) -> Result<(), ClientError>;
}
