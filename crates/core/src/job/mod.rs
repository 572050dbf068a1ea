//! Conversion job data model.
//!
//! A job is created by the backend when an upload completes and is
//! afterwards addressed by its id plus the capability token issued with it.

mod naming;
mod types;

pub use naming::download_file_name;
pub use types::*;
