//! Job status polling.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ClientError, ConversionBackend};
use crate::job::{JobCredentials, JobSnapshot};

/// Polls a job's status at a fixed interval until it reaches a terminal status.
///
/// The interval is measured from the end of one request to the start of the
/// next, so requests for a job never overlap.
pub struct JobPoller {
    backend: Arc<dyn ConversionBackend>,
    interval: Duration,
}

impl JobPoller {
    pub fn new(backend: Arc<dyn ConversionBackend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    /// Fetch a single status snapshot.
    pub async fn fetch(&self, job: &JobCredentials) -> Result<JobSnapshot, ClientError> {
        self.backend.job_status(job).await.map(JobSnapshot::from)
    }

    /// Poll until the job is terminal, handing each snapshot to `on_update`.
    ///
    /// The first request is issued immediately. Any request failure ends
    /// polling with that error; there is no retry. Once `cancel` fires no
    /// request is issued and no snapshot is delivered.
    pub async fn poll_until_terminal<F>(
        &self,
        job: &JobCredentials,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<JobSnapshot, ClientError>
    where
        F: FnMut(&JobSnapshot),
    {
        debug!(job_id = %job.id(), interval_ms = self.interval.as_millis() as u64, "Polling job");

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let snapshot = tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                result = self.fetch(job) => match result {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!(job_id = %job.id(), error = %e, "Status poll failed");
                        return Err(e);
                    }
                },
            };

            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            debug!(
                job_id = %job.id(),
                status = %snapshot.status,
                progress = snapshot.progress,
                "Job status"
            );
            on_update(&snapshot);

            if snapshot.status.is_terminal() {
                info!(job_id = %job.id(), status = %snapshot.status, "Job finished");
                return Ok(snapshot);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
