//! Workflow errors and published updates.

use serde::Serialize;
use thiserror::Error;

use crate::client::ClientError;
use crate::download::{DownloadError, DownloadProgress};
use crate::job::ConversionJob;
use crate::upload::{UploadError, UploadProgress, ValidationError};

use super::state::WorkflowStateKind;

/// Errors that can occur while driving a conversion.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(ClientError),

    #[error(transparent)]
    Download(DownloadError),

    /// The event is not accepted in the current state.
    #[error("Cannot handle {event} while {state}")]
    InvalidTransition {
        state: WorkflowStateKind,
        event: &'static str,
    },

    /// The operation needs a different state (e.g. download before completion).
    #[error("Expected {expected}, but the workflow is {actual}")]
    InvalidState { expected: String, actual: String },

    /// The run was abandoned by start over or a newer conversion.
    #[error("Conversion was cancelled")]
    Cancelled,
}

impl WorkflowError {
    pub fn invalid_state(expected: impl Into<String>, actual: impl ToString) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<ClientError> for WorkflowError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Cancelled => Self::Cancelled,
            other => Self::Client(other),
        }
    }
}

impl From<UploadError> for WorkflowError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(e) => Self::Validation(e),
            UploadError::Client(e) => e.into(),
        }
    }
}

impl From<DownloadError> for WorkflowError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Client(ClientError::Cancelled) => Self::Cancelled,
            other => Self::Download(other),
        }
    }
}

/// Notifications published by a running workflow, in the order they happened.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowUpdate {
    StateChanged {
        from: WorkflowStateKind,
        to: WorkflowStateKind,
    },
    UploadProgress {
        progress: UploadProgress,
    },
    /// A status snapshot was applied to the job record.
    JobUpdated {
        job: ConversionJob,
    },
    DownloadProgress {
        progress: DownloadProgress,
    },
    /// A run failed and the workflow went back to idle.
    Failed {
        message: String,
    },
}
