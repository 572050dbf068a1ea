//! The download operation.

use std::sync::Arc;

use bytes::BytesMut;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::DownloadError;
use super::sink::ArtifactSink;
use super::types::{DownloadMode, DownloadProgress, SavedArtifact};
use crate::client::{ClientError, ConversionBackend};
use crate::job::JobCredentials;

/// Upper bound on the buffer reserved up front from a declared length.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Retrieves a job's artifact and passes it to a sink.
pub struct DownloadOperation {
    backend: Arc<dyn ConversionBackend>,
    sink: Arc<dyn ArtifactSink>,
    mode: DownloadMode,
}

impl DownloadOperation {
    pub fn new(
        backend: Arc<dyn ConversionBackend>,
        sink: Arc<dyn ArtifactSink>,
        mode: DownloadMode,
    ) -> Self {
        Self {
            backend,
            sink,
            mode,
        }
    }

    /// Fetch the artifact for `job` and save it as `file_name`.
    ///
    /// In streamed mode `on_progress` is called per chunk, but only when the
    /// backend declared a length. Once `cancel` fires no further chunk is
    /// consumed and nothing is saved.
    pub async fn run<F>(
        &self,
        job: &JobCredentials,
        file_name: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<SavedArtifact, DownloadError>
    where
        F: FnMut(DownloadProgress),
    {
        info!(job_id = %job.id(), file = %file_name, mode = ?self.mode, "Downloading artifact");

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ClientError::Cancelled.into()),
            result = self.backend.download(job) => result?,
        };
        let total = response.content_length;
        let mut body = match (response.body, self.mode) {
            (Some(body), _) => body,
            (None, DownloadMode::Streamed) => return Err(ClientError::StreamingUnsupported.into()),
            (None, DownloadMode::Buffered) => {
                return Err(ClientError::invalid_response("artifact response has no body").into())
            }
        };

        let mut buffer = BytesMut::with_capacity(total.unwrap_or(0).min(MAX_PREALLOCATION) as usize);
        let mut loaded = 0u64;
        loop {
            let chunk = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!(job_id = %job.id(), received = loaded, "Download cancelled");
                    return Err(ClientError::Cancelled.into());
                }
                next = body.next() => match next {
                    Some(chunk) => chunk?,
                    None => break,
                },
            };
            loaded += chunk.len() as u64;
            buffer.extend_from_slice(&chunk);

            if self.mode == DownloadMode::Streamed {
                if let Some(total) = total {
                    on_progress(DownloadProgress { loaded, total });
                }
            }
        }

        if let Some(total) = total {
            if total != loaded {
                debug!(job_id = %job.id(), declared = total, received = loaded, "Length mismatch");
            }
        }

        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled.into());
        }

        let saved = self
            .sink
            .save(file_name, buffer.freeze())
            .await
            .map_err(|source| {
                warn!(file = %file_name, error = %source, "Failed to save artifact");
                DownloadError::Save {
                    file_name: file_name.to_string(),
                    source,
                }
            })?;

        info!(
            job_id = %job.id(),
            location = %saved.location.display(),
            size = saved.size_bytes,
            "Artifact saved"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockArtifactSink, MockBackend};
    use bytes::Bytes;
    use std::time::Duration;

    fn job() -> JobCredentials {
        JobCredentials::new("job-1", "token-1")
    }

    #[tokio::test]
    async fn test_streamed_download_reports_progress() {
        let backend = Arc::new(MockBackend::new());
        backend
            .set_artifact("job-1", Bytes::from(vec![7u8; 300]), 3)
            .await;
        let sink = Arc::new(MockArtifactSink::new());
        let op = DownloadOperation::new(backend, sink.clone(), DownloadMode::Streamed);

        let mut progress = Vec::new();
        let saved = op
            .run(&job(), "photo.jpg", &CancellationToken::new(), |p| {
                progress.push(p)
            })
            .await
            .unwrap();

        assert_eq!(saved.size_bytes, 300);
        assert_eq!(progress.len(), 3);
        assert_eq!(progress.last().unwrap().loaded, 300);
        assert_eq!(progress.last().unwrap().total, 300);
        assert_eq!(sink.saved("photo.jpg").await.unwrap().len(), 300);
    }

    #[tokio::test]
    async fn test_unknown_length_skips_progress() {
        let backend = Arc::new(MockBackend::new());
        backend.set_artifact("job-1", Bytes::from_static(b"abc"), 1).await;
        backend.set_declare_length(false).await;
        let sink = Arc::new(MockArtifactSink::new());
        let op = DownloadOperation::new(backend, sink.clone(), DownloadMode::Streamed);

        let mut calls = 0;
        op.run(&job(), "a.txt", &CancellationToken::new(), |_| calls += 1)
            .await
            .unwrap();
        assert_eq!(calls, 0);
        assert!(sink.saved("a.txt").await.is_some());
    }

    #[tokio::test]
    async fn test_buffered_download_has_no_progress() {
        let backend = Arc::new(MockBackend::new());
        backend
            .set_artifact("job-1", Bytes::from(vec![1u8; 64]), 4)
            .await;
        let sink = Arc::new(MockArtifactSink::new());
        let op = DownloadOperation::new(backend, sink.clone(), DownloadMode::Buffered);

        let mut calls = 0;
        let saved = op
            .run(&job(), "b.bin", &CancellationToken::new(), |_| calls += 1)
            .await
            .unwrap();
        assert_eq!(calls, 0);
        assert_eq!(saved.size_bytes, 64);
    }

    #[tokio::test]
    async fn test_missing_body_in_streamed_mode() {
        let backend = Arc::new(MockBackend::new());
        backend.set_artifact("job-1", Bytes::from_static(b"abc"), 1).await;
        backend.set_streaming_supported(false).await;
        let sink = Arc::new(MockArtifactSink::new());
        let op = DownloadOperation::new(backend, sink.clone(), DownloadMode::Streamed);

        let err = op
            .run(&job(), "a.txt", &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Client(ClientError::StreamingUnsupported)
        ));
        assert!(sink.saved("a.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_backend_refusal_saves_nothing() {
        let backend = Arc::new(MockBackend::new());
        let sink = Arc::new(MockArtifactSink::new());
        let op = DownloadOperation::new(backend, sink.clone(), DownloadMode::Streamed);

        let err = op
            .run(&job(), "a.txt", &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Client(ClientError::Download { status: 404 })
        ));
        assert!(sink.saved("a.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_sink_failure_is_save_error() {
        let backend = Arc::new(MockBackend::new());
        backend.set_artifact("job-1", Bytes::from_static(b"abc"), 1).await;
        let sink = Arc::new(MockArtifactSink::new());
        sink.fail_next_save().await;
        let op = DownloadOperation::new(backend, sink, DownloadMode::Streamed);

        let err = op
            .run(&job(), "a.txt", &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Save { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_download_saves_nothing() {
        let backend = Arc::new(MockBackend::new());
        backend.set_artifact("job-1", Bytes::from_static(b"abcdef"), 3).await;
        backend.set_chunk_delay(Duration::from_millis(50)).await;
        let sink = Arc::new(MockArtifactSink::new());
        let op = DownloadOperation::new(backend, sink.clone(), DownloadMode::Streamed);

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            canceller.cancel();
        });

        let mut progress = Vec::new();
        let err = op
            .run(&job(), "a.txt", &cancel, |p| progress.push(p))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(progress.len() < 3);
        assert!(sink.saved("a.txt").await.is_none());
    }
}
