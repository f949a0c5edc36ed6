//! Launch strategies.
//!
//! Each strategy first plans an [`Invocation`] from the context (pure, no
//! side effects) and then runs it. Planning is shared by `attempt` and the
//! dry-run used by `doctor`.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use curabridge_core::config::launch::LaunchConfig;
use serde::Serialize;
use tracing::debug;

use crate::executor::LaunchExecutor;
use crate::host::{HostEnvironment, HostOs};

/// Helper binary that runs commands on the host from inside a Flatpak.
const HOST_SPAWN_HELPER: &str = "flatpak-spawn";

/// Flatpak package runner.
const PACKAGE_RUNNER: &str = "flatpak";

/// One way of starting the slicer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStrategy {
    /// The executable configured by the user.
    ConfiguredExecutable,
    /// `flatpak-spawn --host` from inside a sandbox.
    SandboxHostSpawn,
    /// A slicer binary on `PATH` (Linux).
    DirectBinary,
    /// `flatpak run <package>` (Linux).
    PackageRunner,
    /// The registered default handler for the file (Windows).
    OsDefaultHandler,
    /// `open -a <bundle>` (macOS).
    NamedApplication,
}

/// Everything a strategy may consult.
#[derive(Debug, Clone, Copy)]
pub struct LaunchContext<'a> {
    /// File handed to the slicer.
    pub file: &'a Path,
    /// User-configured slicer executable.
    pub configured_path: Option<&'a Path>,
    /// Host snapshot.
    pub host: &'a HostEnvironment,
    /// Launch settings.
    pub config: &'a LaunchConfig,
    /// Process runner.
    pub executor: &'a LaunchExecutor,
}

/// A planned command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Spawn and watch for the grace period.
    Spawn {
        /// Program to run.
        program: PathBuf,
        /// Arguments.
        args: Vec<OsString>,
    },
    /// Ask the OS to open the file; success is the call's own status.
    OsCall {
        /// Program to run.
        program: PathBuf,
        /// Arguments.
        args: Vec<OsString>,
    },
    /// Hand the file to its registered handler without going through a shell.
    ShellOpen {
        /// File to open.
        file: PathBuf,
    },
}

impl Invocation {
    /// Command line for display.
    pub fn command_line(&self) -> String {
        let (program, args) = match self {
            Self::Spawn { program, args } | Self::OsCall { program, args } => (program, args),
            Self::ShellOpen { file } => return format!("shell-open {}", file.display()),
        };
        std::iter::once(program.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The slicer is (believed to be) running.
    Launched {
        /// Process id when a process was spawned and watched.
        pid: Option<u32>,
    },
    /// The strategy ran and failed.
    Failed {
        /// Why it failed.
        reason: String,
    },
    /// Preconditions not met; nothing was run.
    NotApplicable {
        /// Which precondition was missing.
        reason: String,
    },
}

impl AttemptOutcome {
    /// Whether the chain stops here.
    pub fn is_launched(&self) -> bool {
        matches!(self, Self::Launched { .. })
    }

    /// Whether anything was actually run.
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Self::NotApplicable { .. })
    }
}

impl LaunchStrategy {
    /// Strategy order for a host.
    pub fn chain_for(os: HostOs) -> Vec<LaunchStrategy> {
        let mut chain = vec![Self::ConfiguredExecutable, Self::SandboxHostSpawn];
        match os {
            HostOs::Linux => chain.extend([Self::DirectBinary, Self::PackageRunner]),
            HostOs::Windows => chain.push(Self::OsDefaultHandler),
            HostOs::MacOs => chain.push(Self::NamedApplication),
            HostOs::Other => {}
        }
        chain
    }

    /// Stable identifier, also used for capture file names.
    pub fn label(self) -> &'static str {
        match self {
            Self::ConfiguredExecutable => "configured_executable",
            Self::SandboxHostSpawn => "sandbox_host_spawn",
            Self::DirectBinary => "direct_binary",
            Self::PackageRunner => "package_runner",
            Self::OsDefaultHandler => "os_default_handler",
            Self::NamedApplication => "named_application",
        }
    }

    /// Plan the invocation, or explain why the strategy does not apply.
    pub fn plan(self, ctx: &LaunchContext<'_>) -> Result<Invocation, String> {
        let file = ctx.file.as_os_str().to_os_string();
        match self {
            Self::ConfiguredExecutable => {
                let path = ctx
                    .configured_path
                    .ok_or_else(|| "no slicer path configured".to_string())?;
                if !path.is_file() {
                    return Err(format!("configured path {} is not a file", path.display()));
                }
                Ok(Invocation::Spawn {
                    program: path.to_path_buf(),
                    args: vec![file],
                })
            }
            Self::SandboxHostSpawn => {
                if !ctx.host.is_sandboxed() {
                    return Err("not running inside a Flatpak sandbox".to_string());
                }
                let helper = ctx
                    .host
                    .find_executable(HOST_SPAWN_HELPER)
                    .ok_or_else(|| format!("{HOST_SPAWN_HELPER} not found on PATH"))?;

                let mut args = vec![OsString::from("--host")];
                if let Some(home) = ctx.host.home_dir() {
                    let mut dir = OsString::from("--directory=");
                    dir.push(home.as_os_str());
                    args.push(dir);
                }
                args.extend([
                    OsString::from(PACKAGE_RUNNER),
                    OsString::from("run"),
                    OsString::from(&ctx.config.package_id),
                    file,
                ]);
                Ok(Invocation::Spawn {
                    program: helper,
                    args,
                })
            }
            Self::DirectBinary => {
                let binary = ctx
                    .host
                    .find_executable(&ctx.config.binary_name)
                    .ok_or_else(|| format!("{} not found on PATH", ctx.config.binary_name))?;
                Ok(Invocation::Spawn {
                    program: binary,
                    args: vec![file],
                })
            }
            Self::PackageRunner => {
                if ctx.host.find_executable(&ctx.config.binary_name).is_some() {
                    return Err(format!(
                        "{} is on PATH, package runner is only a fallback",
                        ctx.config.binary_name
                    ));
                }
                let runner = ctx
                    .host
                    .find_executable(PACKAGE_RUNNER)
                    .ok_or_else(|| format!("{PACKAGE_RUNNER} not found on PATH"))?;
                Ok(Invocation::Spawn {
                    program: runner,
                    args: vec![
                        OsString::from("run"),
                        OsString::from(&ctx.config.package_id),
                        file,
                    ],
                })
            }
            Self::OsDefaultHandler => Ok(Invocation::ShellOpen {
                file: ctx.file.to_path_buf(),
            }),
            Self::NamedApplication => Ok(Invocation::OsCall {
                program: PathBuf::from("open"),
                args: vec![
                    OsString::from("-a"),
                    OsString::from(&ctx.config.app_bundle),
                    file,
                ],
            }),
        }
    }

    /// Plan and run this strategy.
    pub async fn attempt(self, ctx: &LaunchContext<'_>) -> AttemptOutcome {
        match self.plan(ctx) {
            Err(reason) => {
                debug!(strategy = self.label(), reason = %reason, "Strategy not applicable");
                AttemptOutcome::NotApplicable { reason }
            }
            Ok(Invocation::Spawn { program, args }) => {
                ctx.executor.spawn_watched(self.label(), &program, &args).await
            }
            Ok(Invocation::OsCall { program, args }) => {
                ctx.executor.run_os_call(self.label(), &program, &args).await
            }
            Ok(Invocation::ShellOpen { file }) => ctx.executor.shell_open(self.label(), &file).await,
        }
    }
}

impl fmt::Display for LaunchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ConfiguredExecutable => "configured executable",
            Self::SandboxHostSpawn => "flatpak-spawn --host",
            Self::DirectBinary => "slicer binary on PATH",
            Self::PackageRunner => "flatpak run",
            Self::OsDefaultHandler => "default file handler",
            Self::NamedApplication => "open -a",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn host(os: HostOs, pairs: &[(&str, &str)]) -> HostEnvironment {
        HostEnvironment::new(
            os,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn plan(strategy: LaunchStrategy, host: &HostEnvironment, configured: Option<&Path>) -> Result<Invocation, String> {
        let config = LaunchConfig::default();
        let executor = LaunchExecutor::new(&config);
        let ctx = LaunchContext {
            file: Path::new("/tmp/CuraBridge/part.stl"),
            configured_path: configured,
            host,
            config: &config,
            executor: &executor,
        };
        strategy.plan(&ctx)
    }

    #[test]
    fn test_chain_order_per_os() {
        use LaunchStrategy::*;
        assert_eq!(
            LaunchStrategy::chain_for(HostOs::Linux),
            vec![ConfiguredExecutable, SandboxHostSpawn, DirectBinary, PackageRunner]
        );
        assert_eq!(
            LaunchStrategy::chain_for(HostOs::Windows),
            vec![ConfiguredExecutable, SandboxHostSpawn, OsDefaultHandler]
        );
        assert_eq!(
            LaunchStrategy::chain_for(HostOs::MacOs),
            vec![ConfiguredExecutable, SandboxHostSpawn, NamedApplication]
        );
        assert_eq!(
            LaunchStrategy::chain_for(HostOs::Other),
            vec![ConfiguredExecutable, SandboxHostSpawn]
        );
    }

    #[test]
    fn test_configured_path_must_exist() {
        let h = host(HostOs::Linux, &[]);
        assert!(plan(LaunchStrategy::ConfiguredExecutable, &h, None).is_err());
        let err = plan(
            LaunchStrategy::ConfiguredExecutable,
            &h,
            Some(Path::new("/nonexistent/UltiMaker-Cura")),
        )
        .expect_err("missing");
        assert!(err.contains("/nonexistent/UltiMaker-Cura"));
    }

    #[test]
    fn test_configured_directory_is_not_applicable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let h = host(HostOs::Linux, &[]);
        assert!(plan(LaunchStrategy::ConfiguredExecutable, &h, Some(temp.path())).is_err());
    }

    #[test]
    fn test_default_handler_passes_shell_metacharacters_verbatim() {
        let config = LaunchConfig::default();
        let executor = LaunchExecutor::new(&config);
        let h = host(HostOs::Windows, &[]);
        let file = Path::new(r"C:\Users\me\Downloads\CuraBridge\R&D %PATH%.stl");
        let ctx = LaunchContext {
            file,
            configured_path: None,
            host: &h,
            config: &config,
            executor: &executor,
        };

        let inv = LaunchStrategy::OsDefaultHandler.plan(&ctx).expect("plan");

        assert_eq!(
            inv,
            Invocation::ShellOpen {
                file: file.to_path_buf()
            }
        );
    }

    #[test]
    fn test_os_calls() {
        let h = host(HostOs::Windows, &[]);
        let inv = plan(LaunchStrategy::OsDefaultHandler, &h, None).expect("plan");
        assert_eq!(
            inv,
            Invocation::ShellOpen {
                file: PathBuf::from("/tmp/CuraBridge/part.stl")
            }
        );
        assert_eq!(inv.command_line(), "shell-open /tmp/CuraBridge/part.stl");

        let h = host(HostOs::MacOs, &[]);
        let inv = plan(LaunchStrategy::NamedApplication, &h, None).expect("plan");
        assert_eq!(inv.command_line(), "open -a UltiMaker Cura /tmp/CuraBridge/part.stl");
    }

    #[test]
    fn test_sandbox_requires_flag() {
        let h = host(HostOs::Linux, &[("PATH", "/usr/bin:/bin")]);
        let err = plan(LaunchStrategy::SandboxHostSpawn, &h, None).expect_err("no sandbox");
        assert!(err.contains("sandbox"));
    }

    #[cfg(unix)]
    #[test]
    fn test_sandbox_and_package_runner_commands() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        for name in ["flatpak-spawn", "flatpak"] {
            let p = temp.path().join(name);
            std::fs::write(&p, "#!/bin/sh\n").expect("write");
            std::fs::set_permissions(&p, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        }
        let path_var = temp.path().to_str().expect("utf8");
        let h = host(
            HostOs::Linux,
            &[("PATH", path_var), ("FLATPAK_ID", "org.blender.Blender"), ("HOME", "/home/maker")],
        );

        let inv = plan(LaunchStrategy::SandboxHostSpawn, &h, None).expect("plan");
        assert_eq!(
            inv.command_line(),
            format!(
                "{}/flatpak-spawn --host --directory=/home/maker flatpak run com.ultimaker.cura /tmp/CuraBridge/part.stl",
                path_var
            )
        );

        let inv = plan(LaunchStrategy::PackageRunner, &h, None).expect("plan");
        assert_eq!(
            inv.command_line(),
            format!("{}/flatpak run com.ultimaker.cura /tmp/CuraBridge/part.stl", path_var)
        );
        assert!(plan(LaunchStrategy::DirectBinary, &h, None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_package_runner_skipped_when_binary_present() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        for name in ["cura", "flatpak"] {
            let p = temp.path().join(name);
            std::fs::write(&p, "#!/bin/sh\n").expect("write");
            std::fs::set_permissions(&p, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        }
        let h = host(HostOs::Linux, &[("PATH", temp.path().to_str().expect("utf8"))]);

        assert!(plan(LaunchStrategy::DirectBinary, &h, None).is_ok());
        assert!(plan(LaunchStrategy::PackageRunner, &h, None).is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&AttemptOutcome::NotApplicable {
            reason: "no slicer path configured".to_string(),
        })
        .expect("serialize");
        assert!(json.contains("\"outcome\":\"not_applicable\""));
    }
}
