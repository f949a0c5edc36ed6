//! Cura Bridge command-line interface.

pub mod commands;
pub mod output;

pub use commands::Cli;
