//! Launch errors.

use std::path::PathBuf;

use curabridge_core::error::{BridgeError, ErrorKind};
use thiserror::Error;

/// Errors from the launch resolver.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No strategy produced a running slicer.
    #[error("Could not launch the slicer ({tried} strategies tried); the STL is kept at {file}")]
    Exhausted {
        /// Exported file left on disk.
        file: PathBuf,
        /// Number of strategies that were actually attempted.
        tried: usize,
    },
}

impl From<LaunchError> for BridgeError {
    fn from(err: LaunchError) -> Self {
        BridgeError::with_source(ErrorKind::LaunchExhausted, err.to_string(), err)
    }
}
