//! Testing utilities and mock implementations.
//!
//! Mocks for the backend and artifact sink seams, so workflows can be driven
//! end to end without a conversion service.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileflow_core::testing::{fixtures, MockArtifactSink, MockBackend};
//!
//! let backend = Arc::new(MockBackend::new());
//! let sink = Arc::new(MockArtifactSink::new());
//! backend.script_statuses("job-1", vec![(JobStatus::Completed, 100)]).await;
//!
//! let workflow = ConversionWorkflow::new(backend, sink, fixtures::workflow_config());
//! let job = workflow.convert(fixtures::source_file("photo.png", 1024), "jpg").await?;
//! ```

mod mock_backend;
mod mock_sink;

pub use mock_backend::{MockBackend, RecordedUpload};
pub use mock_sink::MockArtifactSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::time::Duration;

    use crate::catalog;
    use crate::download::DownloadMode;
    use crate::upload::SourceFile;
    use crate::workflow::WorkflowConfig;

    /// A source file that does not need to exist on disk.
    ///
    /// The MIME type is inferred from the extension.
    pub fn source_file(file_name: &str, size: u64) -> SourceFile {
        let mime_type = file_name
            .rsplit_once('.')
            .and_then(|(_, ext)| catalog::mime_type_for_extension(ext))
            .unwrap_or("application/octet-stream");
        SourceFile::new(
            format!("/fixtures/{}", file_name),
            file_name,
            mime_type,
            size,
        )
    }

    /// Workflow settings with a short poll interval.
    pub fn workflow_config() -> WorkflowConfig {
        WorkflowConfig {
            poll_interval: Duration::from_millis(5),
            max_file_size_bytes: 500 * 1024 * 1024,
            download_mode: DownloadMode::Streamed,
            update_buffer: 256,
        }
    }
}
