//! Artifact retrieval: fetch a completed job's converted file and hand it to
//! a sink under its derived name.

mod error;
mod operation;
mod sink;
mod types;

pub use error::DownloadError;
pub use operation::DownloadOperation;
pub use sink::{ArtifactSink, FsArtifactSink};
pub use types::{DownloadMode, DownloadProgress, SavedArtifact};
