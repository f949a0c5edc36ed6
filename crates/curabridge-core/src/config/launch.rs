//! Slicer launch configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// How the slicer is located and started.
#[derive(Debug, Clone, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// How long a spawned process must survive to count as launched.
    #[validate(range(min = 50, max = 60000))]
    pub grace_period_ms: u64,
    /// Sandboxed package identifier used with `flatpak run`.
    pub package_id: String,
    /// Bare binary name searched on `PATH` on Linux.
    pub binary_name: String,
    /// Application bundle name passed to `open -a` on macOS.
    pub app_bundle: String,
    /// Capture stdout/stderr of spawned processes for diagnostics.
    pub capture_output: bool,
    /// Directory for captured process output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period_ms(),
            package_id: "com.ultimaker.cura".to_string(),
            binary_name: "cura".to_string(),
            app_bundle: "UltiMaker Cura".to_string(),
            capture_output: true,
            log_dir: None,
        }
    }
}

fn default_grace_period_ms() -> u64 {
    1000
}

impl LaunchConfig {
    /// Grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Resolve the effective directory for captured process output.
    ///
    /// Defaults to the per-user cache directory. Each strategy keeps the
    /// output of its most recent attempt.
    pub fn effective_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

/// `<cache_dir>/cura-bridge/logs`, or a temp subdirectory without one.
pub fn default_log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cura-bridge")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grace_period() {
        let config = LaunchConfig::default();
        assert_eq!(config.grace_period(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grace_period_out_of_range() {
        let config = LaunchConfig {
            grace_period_ms: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_dir_default_is_per_user_cache() {
        let config = LaunchConfig::default();
        let dir = config.effective_log_dir();
        assert!(dir.ends_with("cura-bridge/logs"));
        if let Some(cache) = dirs::cache_dir() {
            assert!(dir.starts_with(cache));
        }
    }

    #[test]
    fn test_explicit_log_dir_wins() {
        let config = LaunchConfig {
            log_dir: Some(PathBuf::from("/var/log/cura-bridge")),
            ..Default::default()
        };
        assert_eq!(config.effective_log_dir(), PathBuf::from("/var/log/cura-bridge"));
    }
}
