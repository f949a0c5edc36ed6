//! Unified error types for Cura Bridge.
//!
//! Every crate maps its internal errors into [`BridgeError`] so the CLI has a
//! single type to report and a single place to pick the exit status.

use std::fmt;
use thiserror::Error;

/// Error categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No mesh among the selected objects, or an unknown object was named.
    Selection,
    /// The mesh exporter failed.
    Export,
    /// Every launch strategy failed or none applied to this host.
    LaunchExhausted,
    /// Configuration could not be loaded or written.
    Configuration,
    /// A configuration value is out of range.
    Validation,
    /// A filesystem operation failed.
    Io,
    /// Input data could not be parsed.
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selection => write!(f, "SELECTION"),
            Self::Export => write!(f, "EXPORT"),
            Self::LaunchExhausted => write!(f, "LAUNCH_EXHAUSTED"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Io => write!(f, "IO"),
            Self::Parse => write!(f, "PARSE"),
        }
    }
}

/// The error returned across crate boundaries.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct BridgeError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BridgeError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Process exit status for this error.
    ///
    /// Launch exhaustion gets its own status because the STL was written.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::LaunchExhausted => 2,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for BridgeError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for BridgeError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(
            ErrorKind::Validation,
            format!("Invalid configuration: {err}"),
            err,
        )
    }
}
