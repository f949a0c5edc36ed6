//! Bridge configuration.
//!
//! Values come from an optional TOML file merged with environment
//! variables prefixed with `CURA_BRIDGE` (sections separated by `__`, e.g.
//! `CURA_BRIDGE__LAUNCH__GRACE_PERIOD_MS=1500`).

pub mod export;
pub mod launch;
pub mod logging;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::export::ExportSettings;
use self::launch::LaunchConfig;
use self::logging::LoggingConfig;

use crate::error::BridgeError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CURA_BRIDGE";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Absolute path to the slicer executable. Empty or unset means auto-detect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slicer_path: Option<PathBuf>,
    /// Export directory override. Unset means `<home>/Downloads/CuraBridge`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    /// Display name shown in command output headers.
    pub tab_name: String,
    /// STL export settings.
    #[validate(nested)]
    pub export: ExportSettings,
    /// Slicer launch settings.
    #[validate(nested)]
    pub launch: LaunchConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            slicer_path: None,
            export_dir: None,
            tab_name: "Cura".to_string(),
            export: ExportSettings::default(),
            launch: LaunchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the per-user default file
    /// is read if present. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, BridgeError> {
        let file_source = match path {
            Some(p) => config::File::from(p.to_path_buf()).required(true),
            None => config::File::from(default_config_path()).required(false),
        };

        let config = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| BridgeError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| BridgeError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, BridgeError> {
        toml::to_string_pretty(self)
            .map_err(|e| BridgeError::configuration(format!("Failed to serialize config: {e}")))
    }

    /// The configured slicer path, treating an empty value as unset.
    pub fn configured_slicer_path(&self) -> Option<&Path> {
        self.slicer_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Resolve the effective export directory.
    pub fn effective_export_dir(&self) -> PathBuf {
        match self.export_dir.as_deref().and_then(non_blank) {
            Some(dir) => absolutize(&expand_home(dir)),
            None => default_export_dir(),
        }
    }
}

/// `<home>/Downloads/CuraBridge`, or a temp subdirectory without a home.
pub fn default_export_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("Downloads")
        .join("CuraBridge")
}

/// Per-user configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cura-bridge")
        .join("config.toml")
}

fn non_blank(path: &Path) -> Option<&Path> {
    let s = path.to_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(Path::new(trimmed))
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Make `path` absolute against the current directory without touching the filesystem.
pub fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
