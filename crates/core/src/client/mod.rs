//! Backend client - the HTTP surface of the conversion service.
//!
//! The [`ConversionBackend`] trait is the seam the operations are written
//! against; [`HttpBackend`] is the reqwest implementation.

mod error;
mod http;
mod traits;
mod types;

pub use error::ClientError;
pub use http::HttpBackend;
pub use traits::ConversionBackend;
pub use types::*;
