//! Mock conversion backend for testing.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::client::{
    ArtifactResponse, ClientError, ConversionBackend, JobStatusResponse, UploadResponse,
};
use crate::job::{JobCredentials, JobStatus};
use crate::upload::{SourceFile, UploadProgress};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub target_format: String,
    /// Job id the mock assigned.
    pub job_id: String,
}

#[derive(Debug, Clone)]
struct StoredArtifact {
    data: Bytes,
    chunks: usize,
}

/// Mock implementation of the ConversionBackend trait.
///
/// Provides controllable behavior for testing:
/// - Job ids are assigned sequentially ("job-1", "job-2", ...)
/// - Status responses are scripted per job; the last entry repeats
/// - Artifacts are served in a configurable number of chunks
/// - The next call of any kind can be made to fail
///
/// # Example
///
/// ```rust,ignore
/// use fileflow_core::testing::MockBackend;
///
/// let backend = MockBackend::new();
/// backend.script_statuses("job-1", vec![
///     (JobStatus::Processing, 50),
///     (JobStatus::Completed, 100),
/// ]).await;
/// backend.set_artifact("job-1", Bytes::from_static(b"data"), 1).await;
///
/// // Drive a workflow against it...
/// assert_eq!(backend.status_calls().await, 2);
/// ```
#[derive(Debug)]
pub struct MockBackend {
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    next_job: Arc<RwLock<u64>>,
    statuses: Arc<RwLock<HashMap<String, VecDeque<(JobStatus, u8)>>>>,
    failure_messages: Arc<RwLock<HashMap<String, String>>>,
    status_calls: Arc<RwLock<usize>>,
    artifacts: Arc<RwLock<HashMap<String, StoredArtifact>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<ClientError>>>,
    upload_steps: Arc<RwLock<u64>>,
    upload_delay: Arc<RwLock<Duration>>,
    status_delay: Arc<RwLock<Duration>>,
    chunk_delay: Arc<RwLock<Duration>>,
    declare_length: Arc<RwLock<bool>>,
    streaming_supported: Arc<RwLock<bool>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_job: Arc::new(RwLock::new(1)),
            statuses: Arc::new(RwLock::new(HashMap::new())),
            failure_messages: Arc::new(RwLock::new(HashMap::new())),
            status_calls: Arc::new(RwLock::new(0)),
            artifacts: Arc::new(RwLock::new(HashMap::new())),
            deleted: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            upload_steps: Arc::new(RwLock::new(0)),
            upload_delay: Arc::new(RwLock::new(Duration::ZERO)),
            status_delay: Arc::new(RwLock::new(Duration::ZERO)),
            chunk_delay: Arc::new(RwLock::new(Duration::ZERO)),
            declare_length: Arc::new(RwLock::new(true)),
            streaming_supported: Arc::new(RwLock::new(true)),
        }
    }

    /// Get all recorded uploads.
    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Script the status responses for a job, in order.
    pub async fn script_statuses(&self, job_id: &str, script: Vec<(JobStatus, u8)>) {
        self.statuses
            .write()
            .await
            .insert(job_id.to_string(), script.into());
    }

    /// Error message reported with a job's FAILED/EXPIRED statuses.
    pub async fn set_failure_message(&self, job_id: &str, message: &str) {
        self.failure_messages
            .write()
            .await
            .insert(job_id.to_string(), message.to_string());
    }

    /// Number of status requests served (including failed ones).
    pub async fn status_calls(&self) -> usize {
        *self.status_calls.read().await
    }

    /// Serve `data` as the artifact of `job_id`, split into `chunks` pieces.
    pub async fn set_artifact(&self, job_id: &str, data: Bytes, chunks: usize) {
        self.artifacts.write().await.insert(
            job_id.to_string(),
            StoredArtifact {
                data,
                chunks: chunks.max(1),
            },
        );
    }

    /// Whether downloads declare a content length.
    pub async fn set_declare_length(&self, declare: bool) {
        *self.declare_length.write().await = declare;
    }

    /// When false, downloads come back without a readable body.
    pub async fn set_streaming_supported(&self, supported: bool) {
        *self.streaming_supported.write().await = supported;
    }

    /// Job ids passed to delete_job.
    pub async fn deleted_jobs(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Number of intermediate progress events sent per upload.
    pub async fn set_upload_steps(&self, steps: u64) {
        *self.upload_steps.write().await = steps;
    }

    /// Simulated time spent sending the upload body.
    pub async fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.write().await = delay;
    }

    /// Simulated latency of each status request.
    pub async fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.write().await = delay;
    }

    /// Simulated pause before each artifact chunk arrives.
    pub async fn set_chunk_delay(&self, delay: Duration) {
        *self.chunk_delay.write().await = delay;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ClientError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl ConversionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(
        &self,
        file: &SourceFile,
        target_format: &str,
        progress: mpsc::Sender<UploadProgress>,
    ) -> Result<UploadResponse, ClientError> {
        let steps = *self.upload_steps.read().await;
        let delay = *self.upload_delay.read().await;
        for step in 1..=steps {
            let loaded = file.size * step / steps;
            let _ = progress.send(UploadProgress::new(loaded, file.size)).await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let job_id = {
            let mut next = self.next_job.write().await;
            let id = format!("job-{}", *next);
            *next += 1;
            id
        };

        self.uploads.write().await.push(RecordedUpload {
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            target_format: target_format.to_string(),
            job_id: job_id.clone(),
        });

        let now = Utc::now();
        Ok(UploadResponse {
            token: format!("token-{}", job_id),
            job_id,
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            file_size: file.size,
            target_format: target_format.to_string(),
            created_at: Some(now),
            expires_at: Some(now + chrono::Duration::hours(24)),
        })
    }

    async fn job_status(&self, job: &JobCredentials) -> Result<JobStatusResponse, ClientError> {
        *self.status_calls.write().await += 1;

        let delay = *self.status_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let (status, progress) = {
            let mut statuses = self.statuses.write().await;
            let script = statuses
                .get_mut(job.id())
                .ok_or_else(|| ClientError::backend(404, "Job not found"))?;
            let entry = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            };
            entry.ok_or_else(|| ClientError::backend(404, "Job not found"))?
        };

        let error_message = if status.is_failure() {
            self.failure_messages.read().await.get(job.id()).cloned()
        } else {
            None
        };

        Ok(JobStatusResponse {
            job_id: job.id().to_string(),
            status,
            file_name: String::new(),
            source_format: String::new(),
            target_format: String::new(),
            progress: progress as i32,
            error_message,
            created_at: None,
            completed_at: status.is_terminal().then(Utc::now),
            download_url: (status == JobStatus::Completed)
                .then(|| format!("/api/jobs/{}/download", job.id())),
        })
    }

    async fn download(&self, job: &JobCredentials) -> Result<ArtifactResponse, ClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let artifact = self
            .artifacts
            .read()
            .await
            .get(job.id())
            .cloned()
            .ok_or(ClientError::Download { status: 404 })?;

        let content_length = if *self.declare_length.read().await {
            Some(artifact.data.len() as u64)
        } else {
            None
        };

        if !*self.streaming_supported.read().await {
            return Ok(ArtifactResponse {
                content_length,
                body: None,
            });
        }

        let chunk_size = artifact.data.len().div_ceil(artifact.chunks).max(1);
        let chunks: Vec<Result<Bytes, ClientError>> = artifact
            .data
            .chunks(chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        let delay = *self.chunk_delay.read().await;
        let body = futures::stream::iter(chunks).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            chunk
        });

        Ok(ArtifactResponse {
            content_length,
            body: Some(Box::pin(body)),
        })
    }

    async fn delete_job(&self, job: &JobCredentials) -> Result<(), ClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.deleted.write().await.push(job.id().to_string());
        Ok(())
    }
}
