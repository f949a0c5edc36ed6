//! # Cura Bridge Core
//!
//! Shared configuration schemas, export settings and the unified error
//! type used by every Cura Bridge crate.

pub mod config;
pub mod error;
pub mod result;

pub use config::BridgeConfig;
pub use config::export::{Axis, ExportSettings};
pub use config::launch::LaunchConfig;
pub use error::{BridgeError, ErrorKind};
pub use result::BridgeResult;
