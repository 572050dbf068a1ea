//! Job data model shared by the operations and the workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Backend-reported job status.
///
/// Statuses only move forward: `Queued` -> `Processing` -> one terminal
/// status. Terminal statuses are flat; none leads to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Expired,
}

impl JobStatus {
    /// Whether no further progress is expected after this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Expired)
    }

    /// Whether the job ended without a usable artifact.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Expired)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Processing => 1,
            Self::Completed | Self::Failed | Self::Expired => 2,
        }
    }

    /// Whether moving from `self` to `next` respects forward-only ordering.
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return *self == next;
        }
        next.rank() >= self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job identity plus the capability token scoped to it.
///
/// The token is redacted from `Debug` output and never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct JobCredentials {
    id: String,
    token: String,
}

impl JobCredentials {
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for JobCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCredentials")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// What a successful upload hands back: the job identity and echoed metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    pub credentials: JobCredentials,
    pub file_name: String,
    /// MIME type the backend detected for the upload.
    pub source_format: String,
    pub file_size: u64,
    pub target_format: String,
    pub created_at: Option<DateTime<Utc>>,
    /// When the backend will purge the upload and its artifact.
    pub expires_at: Option<DateTime<Utc>>,
}

/// One status poll result, mapped onto the fields the workflow tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Backend-provided download location. Informational only; downloads use
    /// the derived `/api/jobs/{id}/download` path.
    pub download_url: Option<String>,
}

/// The conversion job record the workflow owns for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionJob {
    #[serde(skip)]
    credentials: JobCredentials,
    pub id: String,
    pub file_name: String,
    pub source_format: String,
    pub target_format: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ConversionJob {
    /// Seed a job record from an upload result: `Queued`, progress 0.
    pub fn from_descriptor(descriptor: JobDescriptor) -> Self {
        Self {
            id: descriptor.credentials.id().to_string(),
            credentials: descriptor.credentials,
            file_name: descriptor.file_name,
            source_format: descriptor.source_format,
            target_format: descriptor.target_format,
            status: JobStatus::Queued,
            progress: 0,
            error: None,
            created_at: descriptor.created_at,
            expires_at: descriptor.expires_at,
            completed_at: None,
        }
    }

    pub fn credentials(&self) -> &JobCredentials {
        &self.credentials
    }

    /// Merge a poll snapshot into the record.
    ///
    /// A snapshot that would move the status backwards, or that belongs to a
    /// different job, leaves the status unchanged. Progress never decreases
    /// while the job is non-terminal.
    pub fn apply_snapshot(&mut self, snapshot: &JobSnapshot) {
        if snapshot.job_id != self.id {
            warn!(
                job_id = %self.id,
                snapshot_job_id = %snapshot.job_id,
                "Ignoring status snapshot for a different job"
            );
            return;
        }

        if self.status.can_advance_to(snapshot.status) {
            self.status = snapshot.status;
        } else {
            warn!(
                job_id = %self.id,
                current = %self.status,
                reported = %snapshot.status,
                "Ignoring backwards job status"
            );
        }

        let progress = snapshot.progress.min(100);
        if self.status.is_terminal() {
            self.progress = progress.max(self.progress);
        } else if progress >= self.progress {
            self.progress = progress;
        }

        if snapshot.error_message.is_some() {
            self.error = snapshot.error_message.clone();
        }
        if snapshot.completed_at.is_some() {
            self.completed_at = snapshot.completed_at;
        }
    }

    /// Name the finished artifact is saved under.
    pub fn download_file_name(&self) -> String {
        super::download_file_name(&self.file_name, &self.target_format)
    }
}
