//! Host operating system and environment hints.
//!
//! Strategies never read the process environment directly. They consult a
//! [`HostEnvironment`] snapshot so a launch can be resolved for any host.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Variable set by the Flatpak runtime inside a sandbox.
pub const SANDBOX_ENV_VAR: &str = "FLATPAK_ID";

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostOs {
    /// Microsoft Windows.
    Windows,
    /// Linux.
    Linux,
    /// Apple macOS.
    MacOs,
    /// Anything else.
    Other,
}

impl HostOs {
    /// The family this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "Windows"),
            Self::Linux => write!(f, "Linux"),
            Self::MacOs => write!(f, "macOS"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Snapshot of the host used to resolve launch strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Operating system family.
    pub os: HostOs,
    /// Environment hints (`PATH`, `FLATPAK_ID`, `HOME`, ...).
    pub vars: HashMap<String, String>,
}

impl HostEnvironment {
    /// Build from explicit values.
    pub fn new(os: HostOs, vars: HashMap<String, String>) -> Self {
        Self { os, vars }
    }

    /// Capture the running process's OS and environment.
    pub fn current() -> Self {
        Self::from_vars_os(HostOs::current(), std::env::vars_os())
    }

    /// Build from raw environment pairs. Pairs that are not valid UTF-8 are
    /// skipped and logged.
    pub fn from_vars_os(os: HostOs, vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let vars = vars
            .into_iter()
            .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
                (Ok(k), Ok(v)) => Some((k, v)),
                (Ok(k), Err(_)) => {
                    debug!(var = %k, "Skipping environment variable with a non-UTF-8 value");
                    None
                }
                (Err(k), _) => {
                    debug!(var = ?k, "Skipping environment variable with a non-UTF-8 name");
                    None
                }
            })
            .collect();
        Self::new(os, vars)
    }

    /// A non-empty environment hint.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether we are inside a Flatpak sandbox.
    pub fn is_sandboxed(&self) -> bool {
        self.var(SANDBOX_ENV_VAR).is_some()
    }

    /// The user's home directory according to the hints.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME")
            .or_else(|| self.var("USERPROFILE"))
            .map(PathBuf::from)
    }

    /// Look up an executable on the hinted search path.
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let paths = self.var("PATH")?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(name, Some(paths), cwd).ok()
    }
}
