//! Run log querying: blob decoding, formatting and the query service.

pub mod decode;
pub mod domain;
pub mod error;
pub mod format;
pub mod service;

pub use domain::{Run, RunDetails, RunMetadata, RunRecord};
pub use error::RunError;
pub use service::RunQueryService;
