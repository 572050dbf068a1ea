//! Conversion workflow runner.
//!
//! Applies events to the state machine, runs the effects it asks for and
//! publishes the results:
//! - State snapshots: `watch` channel (latest value only)
//! - Ordered updates: `broadcast` channel (progress, job changes, failures)
//!
//! Every upload run gets a generation number. Events produced by a run are
//! applied only while that run is still current, so results of an abandoned
//! run never reach the state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{self, FormatOption};
use crate::client::ConversionBackend;
use crate::download::{ArtifactSink, DownloadOperation, SavedArtifact};
use crate::job::{ConversionJob, JobStatus};
use crate::poller::JobPoller;
use crate::upload::{SourceFile, UploadOperation};

use super::config::WorkflowConfig;
use super::state::{WorkflowEffect, WorkflowEvent, WorkflowMachine, WorkflowState};
use super::types::{WorkflowError, WorkflowUpdate};

/// Mutable state guarded by one lock.
struct Machine {
    state: WorkflowState,
    generation: u64,
    cancel: CancellationToken,
}

/// Identity of one upload-and-poll run.
#[derive(Clone)]
struct Run {
    generation: u64,
    cancel: CancellationToken,
}

struct Applied {
    effects: Vec<WorkflowEffect>,
    run: Run,
}

struct Inner {
    rules: WorkflowMachine,
    backend: Arc<dyn ConversionBackend>,
    uploader: UploadOperation,
    poller: JobPoller,
    downloader: DownloadOperation,
    machine: Mutex<Machine>,
    state_tx: watch::Sender<WorkflowState>,
    updates_tx: broadcast::Sender<WorkflowUpdate>,
}

/// Drives one file at a time through upload, processing and completion.
///
/// Cheap to clone; clones share the same workflow.
#[derive(Clone)]
pub struct ConversionWorkflow {
    inner: Arc<Inner>,
}

impl ConversionWorkflow {
    pub fn new(
        backend: Arc<dyn ConversionBackend>,
        sink: Arc<dyn ArtifactSink>,
        config: WorkflowConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::default());
        let (updates_tx, _) = broadcast::channel(config.update_buffer.max(1));

        let inner = Inner {
            rules: WorkflowMachine::new(config.max_file_size_bytes),
            uploader: UploadOperation::new(backend.clone(), config.max_file_size_bytes),
            poller: JobPoller::new(backend.clone(), config.poll_interval),
            downloader: DownloadOperation::new(backend.clone(), sink, config.download_mode),
            backend,
            machine: Mutex::new(Machine {
                state: WorkflowState::default(),
                generation: 0,
                cancel: CancellationToken::new(),
            }),
            state_tx,
            updates_tx,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    /// The job of the current run, once the upload was accepted.
    pub fn current_job(&self) -> Option<ConversionJob> {
        self.lock().state.job().cloned()
    }

    /// Subscribe to ordered updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowUpdate> {
        self.inner.updates_tx.subscribe()
    }

    /// Watch the latest state.
    pub fn watch_state(&self) -> watch::Receiver<WorkflowState> {
        self.inner.state_tx.subscribe()
    }

    /// Targets offered for the currently selected source format.
    pub fn output_formats(&self) -> Vec<FormatOption> {
        match &self.lock().state {
            WorkflowState::Idle(idle) => idle
                .selection
                .source_format
                .as_deref()
                .map(catalog::output_formats_for)
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn select_source_format(&self, mime_type: &str) -> Result<(), WorkflowError> {
        self.apply(None, WorkflowEvent::SourceFormatSelected(mime_type.to_string()))
            .map(|_| ())
    }

    pub fn select_target_format(&self, format: &str) -> Result<(), WorkflowError> {
        self.apply(None, WorkflowEvent::TargetFormatSelected(format.to_string()))
            .map(|_| ())
    }

    /// Choose the file to convert. Files over the size ceiling are rejected
    /// and the current selection is kept.
    pub fn select_file(&self, file: SourceFile) -> Result<(), WorkflowError> {
        self.apply(None, WorkflowEvent::FileSelected(file)).map(|_| ())
    }

    pub fn clear_file(&self) -> Result<(), WorkflowError> {
        self.apply(None, WorkflowEvent::FileCleared).map(|_| ())
    }

    /// Abandon any run in flight and return to an empty idle state.
    pub fn start_over(&self) {
        // Start over is accepted in every state.
        if let Err(e) = self.apply(None, WorkflowEvent::StartOverRequested) {
            warn!(error = %e, "Start over rejected");
        }
    }

    /// Upload the selected file and wait for the job to finish.
    ///
    /// Resolves to the terminal job record. A job that ends FAILED or EXPIRED
    /// is still `Ok`; the status says how it ended. Returns
    /// [`WorkflowError::Cancelled`] when the run is abandoned before finishing.
    pub async fn start_conversion(&self) -> Result<ConversionJob, WorkflowError> {
        let applied = self.apply(None, WorkflowEvent::ConvertRequested)?;
        let (file, target_format) = applied
            .effects
            .into_iter()
            .find_map(|effect| match effect {
                WorkflowEffect::BeginUpload {
                    file,
                    target_format,
                } => Some((file, target_format)),
                _ => None,
            })
            .ok_or_else(|| WorkflowError::invalid_state("an upload to begin", "idle"))?;

        let run = applied.run;
        match self.drive(&run, &file, &target_format).await {
            Ok(job) => Ok(job),
            Err(WorkflowError::Cancelled) => {
                debug!(generation = run.generation, "Conversion run abandoned");
                Err(WorkflowError::Cancelled)
            }
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "Conversion failed");
                if let Err(stale) = self.apply(
                    Some(run.generation),
                    WorkflowEvent::OperationFailed(e.to_string()),
                ) {
                    debug!(error = %stale, "Failure of an abandoned run ignored");
                    return Err(WorkflowError::Cancelled);
                }
                Err(e)
            }
        }
    }

    /// Select everything for `file` and run the conversion in one call.
    ///
    /// Any run in flight is abandoned first. The source format is the file's
    /// MIME type.
    pub async fn convert(
        &self,
        file: SourceFile,
        target_format: &str,
    ) -> Result<ConversionJob, WorkflowError> {
        self.start_over();
        self.select_source_format(&file.mime_type)?;
        self.select_target_format(target_format)?;
        self.select_file(file)?;
        self.start_conversion().await
    }

    /// Save the artifact of the completed job.
    ///
    /// Failures are returned and leave the state untouched, so the download
    /// can be retried. Starting over while the artifact is in flight stops
    /// the download before anything is saved and returns
    /// [`WorkflowError::Cancelled`].
    pub async fn download(&self) -> Result<SavedArtifact, WorkflowError> {
        let (job, run) = {
            let machine = self.lock();
            match &machine.state {
                WorkflowState::Done { job } if job.status == JobStatus::Completed => (
                    job.clone(),
                    Run {
                        generation: machine.generation,
                        cancel: machine.cancel.clone(),
                    },
                ),
                WorkflowState::Done { job } => {
                    return Err(WorkflowError::invalid_state(
                        "a completed job",
                        format!("done with status {}", job.status),
                    ))
                }
                other => return Err(WorkflowError::invalid_state("done", other.kind())),
            }
        };

        let file_name = job.download_file_name();
        let result = self
            .inner
            .downloader
            .run(job.credentials(), &file_name, &run.cancel, |progress| {
                if self.lock().generation == run.generation {
                    let _ = self
                        .inner
                        .updates_tx
                        .send(WorkflowUpdate::DownloadProgress { progress });
                }
            })
            .await;

        match result {
            Ok(saved) => Ok(saved),
            Err(e) if e.is_cancelled() => {
                debug!(job_id = %job.id, "Download abandoned");
                Err(WorkflowError::Cancelled)
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Download failed");
                Err(e.into())
            }
        }
    }

    /// Delete the finished job on the backend, then start over.
    ///
    /// The workflow resets even when the delete fails; the error is returned
    /// so callers can report it.
    pub async fn discard(&self) -> Result<(), WorkflowError> {
        let job = {
            let machine = self.lock();
            match &machine.state {
                WorkflowState::Done { job } => job.clone(),
                other => return Err(WorkflowError::invalid_state("done", other.kind())),
            }
        };

        let result = self.inner.backend.delete_job(job.credentials()).await;
        match &result {
            Ok(()) => info!(job_id = %job.id, "Job discarded"),
            Err(e) => warn!(job_id = %job.id, error = %e, "Failed to delete job on backend"),
        }

        self.start_over();
        result.map_err(WorkflowError::from)
    }

    /// Upload, then poll until terminal.
    async fn drive(
        &self,
        run: &Run,
        file: &SourceFile,
        target_format: &str,
    ) -> Result<ConversionJob, WorkflowError> {
        let descriptor = self
            .inner
            .uploader
            .run(file, target_format, &run.cancel, |progress| {
                let _ = self.apply(
                    Some(run.generation),
                    WorkflowEvent::UploadProgressed(progress),
                );
            })
            .await?;

        let applied = self.apply(
            Some(run.generation),
            WorkflowEvent::UploadCompleted(descriptor),
        )?;
        let credentials = applied
            .effects
            .into_iter()
            .find_map(|effect| match effect {
                WorkflowEffect::BeginPolling { credentials } => Some(credentials),
                _ => None,
            })
            .ok_or_else(|| WorkflowError::invalid_state("polling to begin", "uploading"))?;

        self.inner
            .poller
            .poll_until_terminal(&credentials, &run.cancel, |snapshot| {
                let _ = self.apply(
                    Some(run.generation),
                    WorkflowEvent::JobStatusReceived(snapshot.clone()),
                );
            })
            .await?;

        let machine = self.lock();
        if machine.generation != run.generation {
            return Err(WorkflowError::Cancelled);
        }
        match &machine.state {
            WorkflowState::Done { job } => Ok(job.clone()),
            other => Err(WorkflowError::invalid_state("done", other.kind())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.inner
            .machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one event and publish what changed.
    ///
    /// With `Some(generation)` the event is dropped (as `Cancelled`) unless
    /// that run is still current.
    fn apply(
        &self,
        generation: Option<u64>,
        event: WorkflowEvent,
    ) -> Result<Applied, WorkflowError> {
        let mut machine = self.lock();

        if let Some(generation) = generation {
            if generation != machine.generation {
                debug!(
                    event = event.name(),
                    run = generation,
                    current = machine.generation,
                    "Dropping event from abandoned run"
                );
                return Err(WorkflowError::Cancelled);
            }
        }

        let event_name = event.name();
        let is_snapshot = matches!(event, WorkflowEvent::JobStatusReceived(_));
        let transition = self.inner.rules.transition(&machine.state, event)?;

        for effect in &transition.effects {
            match effect {
                WorkflowEffect::CancelInFlight | WorkflowEffect::BeginUpload { .. } => {
                    machine.cancel.cancel();
                    machine.generation += 1;
                    machine.cancel = CancellationToken::new();
                }
                WorkflowEffect::BeginPolling { .. } => {}
            }
        }

        let previous = std::mem::replace(&mut machine.state, transition.state);
        if previous.kind() != machine.state.kind() {
            debug!(
                event = event_name,
                from = %previous.kind(),
                to = %machine.state.kind(),
                "Workflow transition"
            );
        }
        self.publish(&previous, &machine.state, is_snapshot);

        Ok(Applied {
            effects: transition.effects,
            run: Run {
                generation: machine.generation,
                cancel: machine.cancel.clone(),
            },
        })
    }

    /// Publish the differences between two states, plus one `JobUpdated` per
    /// applied status snapshot. Called with the lock held so subscribers see
    /// updates in transition order.
    fn publish(&self, previous: &WorkflowState, current: &WorkflowState, is_snapshot: bool) {
        let tx = &self.inner.updates_tx;
        let (from, to) = (previous.kind(), current.kind());
        if from != to {
            let _ = tx.send(WorkflowUpdate::StateChanged { from, to });
        }

        if let Some(progress) = current.upload_progress() {
            if previous.upload_progress() != Some(progress) {
                let _ = tx.send(WorkflowUpdate::UploadProgress { progress });
            }
        }

        if is_snapshot {
            if let Some(job) = current.job() {
                let _ = tx.send(WorkflowUpdate::JobUpdated { job: job.clone() });
            }
        }

        if let Some(message) = current.error() {
            if previous.error() != Some(message) && from != to {
                let _ = tx.send(WorkflowUpdate::Failed {
                    message: message.to_string(),
                });
            }
        }

        if previous != current {
            self.inner.state_tx.send_replace(current.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;
    use crate::testing::{fixtures, MockArtifactSink, MockBackend};
    use crate::workflow::WorkflowStateKind;
    use bytes::Bytes;

    fn workflow(backend: &Arc<MockBackend>) -> (ConversionWorkflow, Arc<MockArtifactSink>) {
        let sink = Arc::new(MockArtifactSink::new());
        let workflow =
            ConversionWorkflow::new(backend.clone(), sink.clone(), fixtures::workflow_config());
        (workflow, sink)
    }

    #[tokio::test]
    async fn test_selection_flow() {
        let backend = Arc::new(MockBackend::new());
        let (workflow, _) = workflow(&backend);

        assert!(workflow.output_formats().is_empty());
        workflow.select_source_format("audio/flac").unwrap();
        let formats: Vec<_> = workflow
            .output_formats()
            .into_iter()
            .map(|f| f.value)
            .collect();
        assert_eq!(formats, vec!["mp3", "wav", "ogg", "aac", "m4a"]);

        workflow.select_target_format("mp3").unwrap();
        workflow
            .select_file(fixtures::source_file("song.flac", 2048))
            .unwrap();
        workflow.clear_file().unwrap();

        let WorkflowState::Idle(idle) = workflow.state() else {
            panic!("expected idle");
        };
        assert!(idle.selection.file.is_none());
        assert_eq!(idle.selection.target_format.as_deref(), Some("mp3"));
    }

    #[tokio::test]
    async fn test_rejected_selection_keeps_state() {
        let backend = Arc::new(MockBackend::new());
        let (workflow, _) = workflow(&backend);
        workflow.select_source_format("image/png").unwrap();
        workflow.select_target_format("jpg").unwrap();

        let before = workflow.state();
        assert!(workflow.select_target_format("mp3").is_err());
        assert_eq!(workflow.state(), before);
    }

    #[tokio::test]
    async fn test_convert_completes() {
        let backend = Arc::new(MockBackend::new());
        backend
            .script_statuses(
                "job-1",
                vec![(JobStatus::Processing, 50), (JobStatus::Completed, 100)],
            )
            .await;
        let (workflow, _) = workflow(&backend);

        let job = workflow
            .convert(fixtures::source_file("photo.png", 1024), "jpg")
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(workflow.state().kind(), WorkflowStateKind::Done);
        assert_eq!(workflow.current_job().unwrap().id, "job-1");
    }

    #[tokio::test]
    async fn test_failed_upload_returns_to_idle_with_error() {
        let backend = Arc::new(MockBackend::new());
        backend
            .set_next_error(crate::client::ClientError::transport("connection refused"))
            .await;
        let (workflow, _) = workflow(&backend);

        let err = workflow
            .convert(fixtures::source_file("photo.png", 1024), "jpg")
            .await
            .unwrap_err();

        let state = workflow.state();
        assert_eq!(state.kind(), WorkflowStateKind::Idle);
        assert_eq!(state.error(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_download_requires_completed_job() {
        let backend = Arc::new(MockBackend::new());
        backend
            .script_statuses("job-1", vec![(JobStatus::Expired, 0)])
            .await;
        let (workflow, _) = workflow(&backend);

        assert!(matches!(
            workflow.download().await,
            Err(WorkflowError::InvalidState { .. })
        ));

        workflow
            .convert(fixtures::source_file("photo.png", 1024), "jpg")
            .await
            .unwrap();
        assert!(matches!(
            workflow.download().await,
            Err(WorkflowError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_saves_artifact() {
        let backend = Arc::new(MockBackend::new());
        backend
            .script_statuses("job-1", vec![(JobStatus::Completed, 100)])
            .await;
        backend
            .set_artifact("job-1", Bytes::from_static(b"converted"), 1)
            .await;
        let (workflow, sink) = workflow(&backend);

        workflow
            .convert(fixtures::source_file("photo.png", 1024), "jpg")
            .await
            .unwrap();
        let saved = workflow.download().await.unwrap();

        assert_eq!(saved.file_name, "photo.jpg");
        assert_eq!(sink.saved("photo.jpg").await.unwrap(), "converted");
    }

    #[tokio::test]
    async fn test_discard_deletes_and_resets() {
        let backend = Arc::new(MockBackend::new());
        backend
            .script_statuses("job-1", vec![(JobStatus::Completed, 100)])
            .await;
        let (workflow, _) = workflow(&backend);

        workflow
            .convert(fixtures::source_file("photo.png", 1024), "jpg")
            .await
            .unwrap();
        workflow.discard().await.unwrap();

        assert_eq!(backend.deleted_jobs().await, vec!["job-1".to_string()]);
        assert_eq!(workflow.state(), WorkflowState::default());
    }

    #[tokio::test]
    async fn test_discard_resets_even_when_delete_fails() {
        let backend = Arc::new(MockBackend::new());
        backend
            .script_statuses("job-1", vec![(JobStatus::Completed, 100)])
            .await;
        let (workflow, _) = workflow(&backend);

        workflow
            .convert(fixtures::source_file("photo.png", 1024), "jpg")
            .await
            .unwrap();
        backend
            .set_next_error(crate::client::ClientError::backend(500, "Delete failed"))
            .await;

        assert!(workflow.discard().await.is_err());
        assert_eq!(workflow.state(), WorkflowState::default());
    }

    #[tokio::test]
    async fn test_watch_state_follows_transitions() {
        let backend = Arc::new(MockBackend::new());
        backend
            .script_statuses("job-1", vec![(JobStatus::Completed, 100)])
            .await;
        let (workflow, _) = workflow(&backend);
        let watcher = workflow.watch_state();

        workflow
            .convert(fixtures::source_file("photo.png", 1024), "jpg")
            .await
            .unwrap();
        assert_eq!(watcher.borrow().kind(), WorkflowStateKind::Done);
    }
}
