pub mod catalog;
pub mod client;
pub mod config;
pub mod download;
pub mod job;
pub mod poller;
pub mod testing;
pub mod upload;
pub mod workflow;

pub use catalog::{FileCategory, FormatOption, InputFormat};
pub use client::{ClientError, ConversionBackend, HttpBackend};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
};
pub use download::{
    ArtifactSink, DownloadError, DownloadMode, DownloadOperation, FsArtifactSink, SavedArtifact,
};
pub use job::{ConversionJob, JobCredentials, JobSnapshot, JobStatus};
pub use poller::JobPoller;
pub use upload::{SourceFile, UploadError, UploadOperation, UploadProgress, ValidationError};
pub use workflow::{
    ConversionWorkflow, WorkflowConfig, WorkflowError, WorkflowState, WorkflowStateKind,
    WorkflowUpdate,
};
