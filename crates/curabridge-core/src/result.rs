//! Convenience result type alias for Cura Bridge.

use crate::error::BridgeError;

/// A specialized `Result` type for Cura Bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
