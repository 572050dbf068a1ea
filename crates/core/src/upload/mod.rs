//! Upload operation: validates a local file against the submission limits,
//! streams it to the backend and resolves to the job descriptor the backend
//! assigns.

mod error;
mod operation;
mod types;

pub use error::{UploadError, ValidationError};
pub use operation::UploadOperation;
pub use types::{SourceFile, UploadProgress};
