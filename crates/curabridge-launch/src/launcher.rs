//! The ordered fallback launcher.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use curabridge_core::config::launch::LaunchConfig;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::LaunchError;
use crate::executor::LaunchExecutor;
use crate::host::{HostEnvironment, HostOs};
use crate::strategy::{AttemptOutcome, Invocation, LaunchContext, LaunchStrategy};

/// One evaluated strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    /// Strategy evaluated.
    pub strategy: LaunchStrategy,
    /// What happened.
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Everything the launcher did for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchReport {
    /// File handed to the slicer.
    pub file: PathBuf,
    /// Strategies in evaluation order, up to and including the winner.
    pub attempts: Vec<AttemptRecord>,
    /// The strategy that started the slicer.
    pub launched_by: Option<LaunchStrategy>,
}

impl LaunchReport {
    /// Whether some strategy reported a running slicer.
    pub fn launched(&self) -> bool {
        self.launched_by.is_some()
    }

    /// Strategies that actually ran something.
    pub fn attempted(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.attempts.iter().filter(|a| a.outcome.was_attempted())
    }

    /// Turn exhaustion into an error.
    pub fn into_result(self) -> Result<LaunchStrategy, LaunchError> {
        match self.launched_by {
            Some(strategy) => Ok(strategy),
            None => Err(LaunchError::Exhausted {
                tried: self.attempted().count(),
                file: self.file,
            }),
        }
    }
}

/// Starts the slicer by walking the strategy chain.
#[derive(Debug, Clone)]
pub struct SlicerLauncher {
    config: LaunchConfig,
    host: HostEnvironment,
    configured_path: Option<PathBuf>,
    executor: LaunchExecutor,
}

impl SlicerLauncher {
    /// Create a launcher for `host`.
    pub fn new(config: LaunchConfig, host: HostEnvironment) -> Self {
        let executor = LaunchExecutor::new(&config);
        Self {
            config,
            host,
            configured_path: None,
            executor,
        }
    }

    /// Set the user-configured slicer executable.
    pub fn with_configured_path(mut self, path: Option<PathBuf>) -> Self {
        self.configured_path = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    /// The host this launcher resolves for.
    pub fn host(&self) -> &HostEnvironment {
        &self.host
    }

    /// Strategy order for this host.
    pub fn chain(&self) -> Vec<LaunchStrategy> {
        LaunchStrategy::chain_for(self.host.os)
    }

    fn context<'a>(&'a self, file: &'a Path) -> LaunchContext<'a> {
        LaunchContext {
            file,
            configured_path: self.configured_path.as_deref(),
            host: &self.host,
            config: &self.config,
            executor: &self.executor,
        }
    }

    /// Plan every strategy without running anything.
    pub fn preview(&self, file: &Path) -> Vec<(LaunchStrategy, Result<Invocation, String>)> {
        let ctx = self.context(file);
        self.chain()
            .into_iter()
            .map(|strategy| (strategy, strategy.plan(&ctx)))
            .collect()
    }

    /// Try strategies in order until one launches the slicer.
    #[instrument(skip(self), fields(os = %self.host.os))]
    pub async fn launch(&self, file: &Path) -> LaunchReport {
        let ctx = self.context(file);
        let mut attempts = Vec::new();
        let mut launched_by = None;

        for strategy in self.chain() {
            let outcome = strategy.attempt(&ctx).await;
            let launched = outcome.is_launched();
            attempts.push(AttemptRecord { strategy, outcome });
            if launched {
                launched_by = Some(strategy);
                break;
            }
        }

        match launched_by {
            Some(strategy) => info!(strategy = strategy.label(), "Slicer launched"),
            None => warn!(
                file = %file.display(),
                attempted = attempts.iter().filter(|a| a.outcome.was_attempted()).count(),
                "No launch strategy succeeded"
            ),
        }

        LaunchReport {
            file: file.to_path_buf(),
            attempts,
            launched_by,
        }
    }
}

/// Launch the slicer with default settings; `true` when something started.
pub async fn launch_slicer(
    exported_file: &Path,
    configured_path: Option<&Path>,
    host_os: HostOs,
    env_hints: HashMap<String, String>,
) -> bool {
    SlicerLauncher::new(LaunchConfig::default(), HostEnvironment::new(host_os, env_hints))
        .with_configured_path(configured_path.map(Path::to_path_buf))
        .launch(exported_file)
        .await
        .launched()
}
