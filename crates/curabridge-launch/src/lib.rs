//! # Cura Bridge Launch
//!
//! Starts the slicer with an exported STL by walking an ordered list of
//! strategies until one reports a running process:
//!
//! 1. the configured executable, if it exists
//! 2. `flatpak-spawn --host` when running inside a Flatpak sandbox
//! 3. Linux: a `cura` binary on `PATH`, else `flatpak run`
//! 4. Windows: the default handler for `.stl`
//! 5. macOS: `open -a` with the application bundle
//!
//! A spawned process that exits within the grace period counts as a failed
//! attempt, and the next strategy is tried.

pub mod error;
pub mod executor;
pub mod host;
pub mod launcher;
pub mod strategy;

pub use error::LaunchError;
pub use executor::LaunchExecutor;
pub use host::{HostEnvironment, HostOs};
pub use launcher::{AttemptRecord, LaunchReport, SlicerLauncher, launch_slicer};
pub use strategy::{AttemptOutcome, Invocation, LaunchContext, LaunchStrategy};
