//! Workflow states and the pure transition function.

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::job::{ConversionJob, JobCredentials, JobDescriptor, JobSnapshot};
use crate::upload::{SourceFile, UploadProgress, ValidationError};

use super::types::WorkflowError;

/// User choices made while idle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub source_format: Option<String>,
    pub target_format: Option<String>,
    pub file: Option<SourceFile>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdleState {
    pub selection: Selection,
    /// Message from the last failed run, cleared when a new file is chosen.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadingState {
    pub source_format: String,
    pub target_format: String,
    pub file: SourceFile,
    pub progress: UploadProgress,
}

/// The workflow state. Each variant carries only the data valid in it.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle(IdleState),
    Uploading(UploadingState),
    /// The backend accepted the file; the job is queued or processing.
    Processing { job: ConversionJob },
    /// The job reached a terminal status.
    Done { job: ConversionJob },
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::Idle(IdleState::default())
    }
}

impl WorkflowState {
    pub fn kind(&self) -> WorkflowStateKind {
        match self {
            Self::Idle(_) => WorkflowStateKind::Idle,
            Self::Uploading(_) => WorkflowStateKind::Uploading,
            Self::Processing { .. } => WorkflowStateKind::Processing,
            Self::Done { .. } => WorkflowStateKind::Done,
        }
    }

    /// The job record, once the upload has been accepted.
    pub fn job(&self) -> Option<&ConversionJob> {
        match self {
            Self::Processing { job } | Self::Done { job } => Some(job),
            _ => None,
        }
    }

    pub fn upload_progress(&self) -> Option<UploadProgress> {
        match self {
            Self::Uploading(uploading) => Some(uploading.progress),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Idle(idle) => idle.error.as_deref(),
            _ => None,
        }
    }
}

/// Discriminant of [`WorkflowState`], for display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStateKind {
    Idle,
    Uploading,
    Processing,
    Done,
}

impl WorkflowStateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for WorkflowStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    SourceFormatSelected(String),
    TargetFormatSelected(String),
    FileSelected(SourceFile),
    FileCleared,
    ConvertRequested,
    UploadProgressed(UploadProgress),
    UploadCompleted(JobDescriptor),
    JobStatusReceived(JobSnapshot),
    /// An upload or poll failed; carries the user-visible message.
    OperationFailed(String),
    StartOverRequested,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SourceFormatSelected(_) => "source_format_selected",
            Self::TargetFormatSelected(_) => "target_format_selected",
            Self::FileSelected(_) => "file_selected",
            Self::FileCleared => "file_cleared",
            Self::ConvertRequested => "convert_requested",
            Self::UploadProgressed(_) => "upload_progressed",
            Self::UploadCompleted(_) => "upload_completed",
            Self::JobStatusReceived(_) => "job_status_received",
            Self::OperationFailed(_) => "operation_failed",
            Self::StartOverRequested => "start_over_requested",
        }
    }
}

/// Work the runner must start after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEffect {
    BeginUpload {
        file: SourceFile,
        target_format: String,
    },
    BeginPolling {
        credentials: JobCredentials,
    },
    /// Abandon whatever upload or poll is running.
    CancelInFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WorkflowState,
    pub effects: Vec<WorkflowEffect>,
}

impl Transition {
    fn to(state: WorkflowState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with_effect(state: WorkflowState, effect: WorkflowEffect) -> Self {
        Self {
            state,
            effects: vec![effect],
        }
    }
}

/// Transition rules of the conversion workflow.
///
/// ```text
/// Idle --ConvertRequested--> Uploading --UploadCompleted--> Processing
///   ^                            |                              |
///   +------OperationFailed-------+------OperationFailed---------+
///                                                               |
///                          Done <--JobStatusReceived(terminal)--+
/// ```
///
/// `StartOverRequested` returns to an empty `Idle` from anywhere. Selection
/// events are accepted only while idle.
#[derive(Debug, Clone)]
pub struct WorkflowMachine {
    max_file_size_bytes: u64,
}

impl WorkflowMachine {
    pub fn new(max_file_size_bytes: u64) -> Self {
        Self {
            max_file_size_bytes,
        }
    }

    /// Compute the next state. On error the caller keeps the current state.
    pub fn transition(
        &self,
        state: &WorkflowState,
        event: WorkflowEvent,
    ) -> Result<Transition, WorkflowError> {
        use WorkflowEvent as E;
        use WorkflowState as S;

        match (state, event) {
            (_, E::StartOverRequested) => Ok(Transition::with_effect(
                WorkflowState::default(),
                WorkflowEffect::CancelInFlight,
            )),

            (S::Idle(idle), E::SourceFormatSelected(source)) => {
                let source = source.trim();
                Ok(Transition::to(S::Idle(IdleState {
                    selection: Selection {
                        source_format: (!source.is_empty()).then(|| source.to_string()),
                        target_format: None,
                        file: None,
                    },
                    error: idle.error.clone(),
                })))
            }

            (S::Idle(idle), E::TargetFormatSelected(target)) => {
                let source = idle
                    .selection
                    .source_format
                    .as_deref()
                    .ok_or(ValidationError::MissingSourceFormat)?;
                let target = target.trim();
                if !target.is_empty() && !catalog::is_conversion_supported(source, target) {
                    return Err(ValidationError::UnsupportedTarget {
                        source_format: source.to_string(),
                        target: target.to_string(),
                    }
                    .into());
                }

                let mut next = idle.clone();
                next.selection.target_format = (!target.is_empty()).then(|| target.to_string());
                Ok(Transition::to(S::Idle(next)))
            }

            (S::Idle(idle), E::FileSelected(file)) => {
                if file.size > self.max_file_size_bytes {
                    return Err(ValidationError::FileTooLarge {
                        size: file.size,
                        max: self.max_file_size_bytes,
                    }
                    .into());
                }

                let mut selection = idle.selection.clone();
                selection.file = Some(file);
                Ok(Transition::to(S::Idle(IdleState {
                    selection,
                    error: None,
                })))
            }

            (S::Idle(idle), E::FileCleared) => {
                let mut selection = idle.selection.clone();
                selection.file = None;
                Ok(Transition::to(S::Idle(IdleState {
                    selection,
                    error: None,
                })))
            }

            (S::Idle(idle), E::ConvertRequested) => {
                let file = idle
                    .selection
                    .file
                    .clone()
                    .ok_or(ValidationError::MissingFile)?;
                let target_format = idle
                    .selection
                    .target_format
                    .clone()
                    .ok_or(ValidationError::MissingTargetFormat)?;
                let source_format = idle
                    .selection
                    .source_format
                    .clone()
                    .ok_or(ValidationError::MissingSourceFormat)?;

                let progress = UploadProgress::start(file.size);
                Ok(Transition::with_effect(
                    S::Uploading(UploadingState {
                        source_format,
                        target_format: target_format.clone(),
                        file: file.clone(),
                        progress,
                    }),
                    WorkflowEffect::BeginUpload {
                        file,
                        target_format,
                    },
                ))
            }

            (S::Uploading(uploading), E::UploadProgressed(progress)) => {
                let mut next = uploading.clone();
                if progress.loaded >= uploading.progress.loaded {
                    next.progress = progress;
                }
                Ok(Transition::to(S::Uploading(next)))
            }

            (S::Uploading(_), E::UploadCompleted(descriptor)) => {
                let credentials = descriptor.credentials.clone();
                Ok(Transition::with_effect(
                    S::Processing {
                        job: ConversionJob::from_descriptor(descriptor),
                    },
                    WorkflowEffect::BeginPolling { credentials },
                ))
            }

            (S::Processing { job }, E::JobStatusReceived(snapshot)) => {
                let mut job = job.clone();
                job.apply_snapshot(&snapshot);
                if job.status.is_terminal() {
                    Ok(Transition::to(S::Done { job }))
                } else {
                    Ok(Transition::to(S::Processing { job }))
                }
            }

            (S::Uploading(uploading), E::OperationFailed(message)) => {
                Ok(Transition::to(S::Idle(IdleState {
                    selection: Selection {
                        source_format: Some(uploading.source_format.clone()),
                        target_format: Some(uploading.target_format.clone()),
                        file: Some(uploading.file.clone()),
                    },
                    error: Some(message),
                })))
            }

            (S::Processing { .. }, E::OperationFailed(message)) => {
                Ok(Transition::to(S::Idle(IdleState {
                    selection: Selection::default(),
                    error: Some(message),
                })))
            }

            (state, event) => Err(WorkflowError::InvalidTransition {
                state: state.kind(),
                event: event.name(),
            }),
        }
    }
}
