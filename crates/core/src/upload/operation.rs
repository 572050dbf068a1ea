//! The upload operation.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{UploadError, ValidationError};
use super::types::{SourceFile, UploadProgress};
use crate::client::{ClientError, ConversionBackend};
use crate::job::JobDescriptor;

/// Progress events buffered between the transport and the caller.
const PROGRESS_BUFFER: usize = 64;

/// Submits one file to the backend and resolves to its job descriptor.
pub struct UploadOperation {
    backend: Arc<dyn ConversionBackend>,
    max_file_size_bytes: u64,
}

impl UploadOperation {
    pub fn new(backend: Arc<dyn ConversionBackend>, max_file_size_bytes: u64) -> Self {
        Self {
            backend,
            max_file_size_bytes,
        }
    }

    /// Check the request without touching the network.
    pub fn validate(&self, file: &SourceFile, target_format: &str) -> Result<(), ValidationError> {
        if file.size > self.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size: file.size,
                max: self.max_file_size_bytes,
            });
        }
        if target_format.trim().is_empty() {
            return Err(ValidationError::MissingTargetFormat);
        }
        Ok(())
    }

    /// Upload `file` for conversion to `target_format`.
    ///
    /// `on_progress` runs on the calling task. It sees non-decreasing `loaded`
    /// values, and `percentage` reaches 100 only once the backend has
    /// acknowledged the upload. Nothing is reported after the result.
    pub async fn run<F>(
        &self,
        file: &SourceFile,
        target_format: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<JobDescriptor, UploadError>
    where
        F: FnMut(UploadProgress),
    {
        self.validate(file, target_format)?;

        info!(
            backend = %self.backend.name(),
            file = %file.file_name,
            size = file.size,
            target = %target_format,
            "Starting upload"
        );

        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_BUFFER);
        let upload = self.backend.upload(file, target_format, progress_tx);
        tokio::pin!(upload);

        let mut last_loaded = 0u64;
        let result = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!(file = %file.file_name, "Upload cancelled");
                    break Err(ClientError::Cancelled);
                }

                Some(progress) = progress_rx.recv() => {
                    if progress.loaded < last_loaded || progress.loaded >= progress.total {
                        continue;
                    }
                    last_loaded = progress.loaded;
                    on_progress(progress);
                }

                result = &mut upload => break result,
            }
        };

        match result {
            Ok(response) => {
                let descriptor = JobDescriptor::from(response);
                on_progress(UploadProgress::complete(file.size));
                info!(
                    job_id = %descriptor.credentials.id(),
                    file = %descriptor.file_name,
                    "Upload accepted"
                );
                Ok(descriptor)
            }
            Err(ClientError::Cancelled) => Err(UploadError::Client(ClientError::Cancelled)),
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "Upload failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use std::time::Duration;

    fn source(size: u64) -> SourceFile {
        SourceFile::new("/tmp/photo.png", "photo.png", "image/png", size)
    }

    #[tokio::test]
    async fn test_upload_reports_progress_then_completes() {
        let backend = Arc::new(MockBackend::new());
        backend.set_upload_steps(4).await;
        let op = UploadOperation::new(backend.clone(), 1024 * 1024);

        let mut events = Vec::new();
        let descriptor = op
            .run(&source(1000), "jpg", &CancellationToken::new(), |p| {
                events.push(p)
            })
            .await
            .unwrap();

        assert_eq!(descriptor.target_format, "jpg");
        let percents: Vec<u8> = events.iter().map(|p| p.percentage).collect();
        assert_eq!(percents, vec![25, 50, 75, 100]);
        assert_eq!(backend.uploads().await.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_file_makes_no_request() {
        let backend = Arc::new(MockBackend::new());
        let op = UploadOperation::new(backend.clone(), 100);

        let err = op
            .run(&source(101), "jpg", &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Validation(ValidationError::FileTooLarge { size: 101, max: 100 })
        ));
        assert!(backend.uploads().await.is_empty());
    }

    #[tokio::test]
    async fn test_file_at_limit_is_accepted() {
        let backend = Arc::new(MockBackend::new());
        let op = UploadOperation::new(backend.clone(), 100);

        let result = op
            .run(&source(100), "jpg", &CancellationToken::new(), |_| {})
            .await;
        tokio_test::assert_ok!(result);
    }

    #[tokio::test]
    async fn test_missing_target_is_rejected() {
        let backend = Arc::new(MockBackend::new());
        let op = UploadOperation::new(backend.clone(), 1024);

        let err = op
            .run(&source(10), "  ", &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::Validation(ValidationError::MissingTargetFormat)
        ));
        assert!(backend.uploads().await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_reports_no_completion() {
        let backend = Arc::new(MockBackend::new());
        backend
            .set_next_error(ClientError::Backend {
                status: 415,
                message: "Unsupported media type".to_string(),
            })
            .await;
        let op = UploadOperation::new(backend.clone(), 1024);

        let mut events = Vec::new();
        let err = op
            .run(&source(10), "jpg", &CancellationToken::new(), |p| {
                events.push(p)
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unsupported media type");
        assert!(events.iter().all(|p| p.percentage < 100));
    }

    #[tokio::test]
    async fn test_cancelled_upload_resolves_cancelled() {
        let backend = Arc::new(MockBackend::new());
        backend.set_upload_delay(Duration::from_secs(5)).await;
        let op = UploadOperation::new(backend.clone(), 1024);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = op
            .run(&source(10), "jpg", &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
