//! Progress lines on stderr.

use fileflow_core::{WorkflowStateKind, WorkflowUpdate};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Upload and download progress is printed in steps of this many percent.
const PERCENT_STEP: u8 = 10;

/// Turns workflow updates into human-readable lines, dropping noise.
#[derive(Debug, Default)]
pub struct ProgressRenderer {
    last_upload: Option<u8>,
    last_download: Option<u8>,
}

impl ProgressRenderer {
    pub fn render(&mut self, update: &WorkflowUpdate) -> Option<String> {
        match update {
            WorkflowUpdate::StateChanged { to, .. } => match to {
                WorkflowStateKind::Uploading => Some("Uploading...".to_string()),
                WorkflowStateKind::Processing => Some("Upload complete, converting...".to_string()),
                WorkflowStateKind::Done | WorkflowStateKind::Idle => None,
            },
            WorkflowUpdate::UploadProgress { progress } => {
                step(&mut self.last_upload, progress.percentage)
                    .map(|p| format!("  uploaded {}%", p))
            }
            WorkflowUpdate::JobUpdated { job } => {
                Some(format!("  {} {}%", job.status, job.progress))
            }
            WorkflowUpdate::DownloadProgress { progress } => {
                step(&mut self.last_download, progress.percentage())
                    .map(|p| format!("  downloaded {}%", p))
            }
            WorkflowUpdate::Failed { message } => Some(format!("Failed: {}", message)),
        }
    }
}

/// Return `percent` when it crossed a step boundary since the last print.
fn step(last: &mut Option<u8>, percent: u8) -> Option<u8> {
    let bucket = percent / PERCENT_STEP;
    match *last {
        Some(prev) if prev / PERCENT_STEP >= bucket => None,
        _ => {
            *last = Some(percent);
            Some(percent)
        }
    }
}

/// Print updates until the channel closes. Updates still queued when the
/// last sender goes away are printed before the task ends.
///
/// Resolves to the number of lines printed.
pub fn spawn_printer(mut rx: broadcast::Receiver<WorkflowUpdate>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut renderer = ProgressRenderer::default();
        let mut printed = 0;
        loop {
            match rx.recv().await {
                Ok(update) => {
                    if let Some(line) = renderer.render(&update) {
                        eprintln!("{}", line);
                        printed += 1;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        printed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileflow_core::UploadProgress;

    fn upload(loaded: u64) -> WorkflowUpdate {
        WorkflowUpdate::UploadProgress {
            progress: UploadProgress::new(loaded, 100),
        }
    }

    #[test]
    fn test_upload_progress_is_stepped() {
        let mut renderer = ProgressRenderer::default();
        let lines: Vec<_> = [0, 3, 9, 10, 15, 42, 99]
            .into_iter()
            .filter_map(|l| renderer.render(&upload(l)))
            .collect();
        assert_eq!(
            lines,
            vec!["  uploaded 0%", "  uploaded 10%", "  uploaded 42%", "  uploaded 99%"]
        );
    }

    #[test]
    fn test_completion_always_printed() {
        let mut renderer = ProgressRenderer::default();
        renderer.render(&upload(95));
        let line = renderer.render(&WorkflowUpdate::UploadProgress {
            progress: UploadProgress::complete(100),
        });
        assert_eq!(line.as_deref(), Some("  uploaded 100%"));
    }

    #[test]
    fn test_failure_line() {
        let mut renderer = ProgressRenderer::default();
        let line = renderer.render(&WorkflowUpdate::Failed {
            message: "Job not found".to_string(),
        });
        assert_eq!(line.as_deref(), Some("Failed: Job not found"));
    }

    #[test]
    fn test_idle_transition_is_silent() {
        let mut renderer = ProgressRenderer::default();
        let line = renderer.render(&WorkflowUpdate::StateChanged {
            from: WorkflowStateKind::Done,
            to: WorkflowStateKind::Idle,
        });
        assert!(line.is_none());
    }

    #[tokio::test]
    async fn test_printer_flushes_queued_updates_on_close() {
        let (tx, rx) = broadcast::channel(16);
        let printer = spawn_printer(rx);

        tx.send(WorkflowUpdate::StateChanged {
            from: WorkflowStateKind::Uploading,
            to: WorkflowStateKind::Processing,
        })
        .unwrap();
        tx.send(WorkflowUpdate::Failed {
            message: "corrupt input".to_string(),
        })
        .unwrap();
        drop(tx);

        assert_eq!(printer.await.unwrap(), 2);
    }
}
