//! # Package-Manager Delegate
//!
//! Installs the front-end build dependencies (which also produces the bundled
//! scripts) and verifies that every build target exists afterwards.
//!
//! ## Flow
//!
//! 1. Probe `<pm> --version`. An unreachable tool is logged, not raised.
//! 2. Install when the tool answered, with `node_modules/.bin` first on the
//!    child's `PATH`. Root gets `--unsafe-perm`.
//! 3. Verify targets; anything missing is a `MissingArtifact` error.

use crate::config::Environment;
use crate::error::GateError;
use crate::journal::BuildLog;
use crate::runner::{CommandRunner, Invocation};
use crate::target::BuildTargets;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Flag letting npm run lifecycle scripts as root.
pub const UNSAFE_PERM_FLAG: &str = "--unsafe-perm";

/// The external package manager and the directory it works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManager {
    name: String,
    node_root: PathBuf,
}

impl PackageManager {
    pub fn new(name: impl Into<String>, node_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            node_root: node_root.into(),
        }
    }

    /// Base name, as used in messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Platform executable name.
    #[must_use]
    pub fn executable(&self) -> String {
        if cfg!(windows) {
            format!("{}.cmd", self.name)
        } else {
            self.name.clone()
        }
    }

    #[must_use]
    pub fn node_root(&self) -> &Path {
        &self.node_root
    }

    #[must_use]
    pub fn node_modules(&self) -> PathBuf {
        self.node_root.join("node_modules")
    }

    /// Locally installed tool binaries.
    #[must_use]
    pub fn local_bin(&self) -> PathBuf {
        self.node_modules().join(".bin")
    }

    /// `<pm> --version`; any spawn error or non-zero exit means unavailable.
    pub fn probe<R: CommandRunner>(&self, runner: &R) -> Result<(), GateError> {
        let invocation = Invocation::new(self.executable()).arg("--version");
        match runner.run(&invocation) {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                tracing::debug!(%status, "{} --version", self.name);
                Err(self.unavailable())
            }
            Err(e) => {
                tracing::debug!(error = %e, "{} --version", self.name);
                Err(self.unavailable())
            }
        }
    }

    fn unavailable(&self) -> GateError {
        GateError::ToolUnavailable {
            tool: self.name.clone(),
        }
    }

    /// `<pm> install [--unsafe-perm]` in the node root.
    pub fn install_invocation(&self, env: &Environment) -> Result<Invocation, GateError> {
        let mut invocation = Invocation::new(self.executable())
            .arg("install")
            .current_dir(&self.node_root)
            .env("PATH", env.search_path_with(&self.local_bin())?);
        if env.is_root() {
            invocation = invocation.arg(UNSAFE_PERM_FLAG);
        }
        Ok(invocation)
    }
}

/// What `run_external_build` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub tool_available: bool,
    pub installed: bool,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tool = if self.tool_available {
            "available"
        } else {
            "unavailable"
        };
        let install = if self.installed {
            "dependencies installed"
        } else {
            "install skipped"
        };
        write!(f, "package manager {tool}, {install}")
    }
}

/// Package manager bound to the targets it must produce.
pub struct Toolchain<'a, R: CommandRunner> {
    pm: PackageManager,
    targets: &'a BuildTargets,
    env: &'a Environment,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Toolchain<'a, R> {
    pub fn new(
        pm: PackageManager,
        targets: &'a BuildTargets,
        env: &'a Environment,
        runner: &'a R,
    ) -> Self {
        Self {
            pm,
            targets,
            env,
            runner,
        }
    }

    #[must_use]
    pub fn package_manager(&self) -> &PackageManager {
        &self.pm
    }

    #[must_use]
    pub fn targets(&self) -> &'a BuildTargets {
        self.targets
    }

    /// Install dependencies and check that every target now exists.
    pub fn run_external_build(&self, log: &mut BuildLog) -> Result<BuildSummary, GateError> {
        let tool_available = match self.pm.probe(self.runner) {
            Ok(()) => true,
            Err(e) => {
                log.error(format!(
                    "{e}.  If you're running this command using sudo, make sure `{}` is available to sudo",
                    self.pm.name()
                ));
                false
            }
        };

        let installed = if self.should_install(tool_available) {
            self.install(log)?;
            true
        } else {
            false
        };

        let missing = self.targets.missing();
        if !missing.is_empty() {
            return Err(GateError::MissingArtifact {
                missing,
                unavailable_tool: (!tool_available).then(|| self.pm.name().to_string()),
            });
        }

        Ok(BuildSummary {
            tool_available,
            installed,
        })
    }

    /// Install whenever the tool is reachable. An existing `node_modules`
    /// does not skip the install.
    fn should_install(&self, tool_available: bool) -> bool {
        let node_modules_present = self.pm.node_modules().is_dir();
        tracing::debug!(node_modules_present, tool_available, "install decision");
        tool_available
    }

    fn install(&self, log: &mut BuildLog) -> Result<(), GateError> {
        log.info(format!(
            "Installing build dependencies with {}.  This may take a while...",
            self.pm.name()
        ));
        let invocation = self.pm.install_invocation(self.env)?;
        let status = self
            .runner
            .run(&invocation)
            .map_err(|e| GateError::BuildFailure {
                command: invocation.to_string(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(GateError::BuildFailure {
                command: invocation.to_string(),
                reason: status.to_string(),
            });
        }

        let node_modules = self.pm.node_modules();
        if let Err(e) = touch(&node_modules) {
            tracing::debug!(error = %e, path = %node_modules.display(), "could not touch");
        }
        Ok(())
    }
}

fn touch(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.set_modified(SystemTime::now())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::ScriptedRunner;
    use std::ffi::OsString;
    use tracing::Level;

    fn fixture() -> (tempfile::TempDir, BuildTargets, PackageManager) {
        let dir = tempfile::tempdir().expect("tempdir");
        let targets = BuildTargets::new(["pkg/static/extension.js", "pkg/static/index.js"])
            .resolved_against(dir.path());
        let pm = PackageManager::new("npm", dir.path().join("js"));
        (dir, targets, pm)
    }

    fn user_env(user: &str) -> Environment {
        Environment {
            path: Some(OsString::from("/usr/bin")),
            user: Some(user.to_string()),
            uid: None,
        }
    }

    #[test]
    fn install_builds_targets() {
        let (_dir, targets, pm) = fixture();
        let env = user_env("dev");
        let runner = ScriptedRunner::new(true).creating(targets.iter().map(Path::to_path_buf).collect());
        let toolchain = Toolchain::new(pm, &targets, &env, &runner);
        let mut log = BuildLog::new();

        let summary = toolchain.run_external_build(&mut log).expect("build");
        assert!(summary.tool_available);
        assert!(summary.installed);
        assert!(targets.all_present());

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec!["--version"]);
        assert_eq!(calls[1].args, vec!["install"]);
        assert!(log.contains(Level::INFO, "Installing build dependencies"));
    }

    #[test]
    fn install_runs_in_node_root_with_local_bin_on_path() {
        let (dir, targets, pm) = fixture();
        let env = user_env("dev");
        let runner = ScriptedRunner::new(true).creating(targets.iter().map(Path::to_path_buf).collect());
        Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut BuildLog::new())
            .expect("build");

        let install = &runner.calls()[1];
        assert_eq!(install.cwd.as_deref(), Some(dir.path().join("js").as_path()));
        let (key, value) = &install.env[0];
        assert_eq!(key, "PATH");
        let first = std::env::split_paths(value).next().expect("entry");
        assert_eq!(first, dir.path().join("js/node_modules/.bin"));
    }

    #[test]
    fn root_user_gets_unsafe_perm() {
        let (_dir, targets, pm) = fixture();
        let env = user_env("root");
        let runner = ScriptedRunner::new(true).creating(targets.iter().map(Path::to_path_buf).collect());
        Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut BuildLog::new())
            .expect("build");

        assert_eq!(runner.calls()[1].args, vec!["install", UNSAFE_PERM_FLAG]);
    }

    #[test]
    fn existing_node_modules_still_installs() {
        let (dir, targets, pm) = fixture();
        std::fs::create_dir_all(dir.path().join("js/node_modules")).expect("mkdir");
        let env = user_env("dev");
        let runner = ScriptedRunner::new(true).creating(targets.iter().map(Path::to_path_buf).collect());

        let summary = Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut BuildLog::new())
            .expect("build");
        assert!(summary.installed);
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn unavailable_tool_logs_error_and_reports_missing_targets() {
        let (dir, targets, pm) = fixture();
        let env = user_env("dev");
        let runner = ScriptedRunner::new(false);
        let mut log = BuildLog::new();

        let err = Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut log)
            .expect_err("targets missing");

        assert!(log.contains(Level::ERROR, "`npm` unavailable"));
        assert!(log.contains(Level::ERROR, "available to sudo"));
        assert_eq!(runner.calls().len(), 1, "no install attempt without the tool");

        match &err {
            GateError::MissingArtifact {
                missing,
                unavailable_tool,
            } => {
                assert_eq!(
                    missing,
                    &vec![
                        dir.path().join("pkg/static/extension.js"),
                        dir.path().join("pkg/static/index.js")
                    ]
                );
                assert_eq!(unavailable_tool.as_deref(), Some("npm"));
            }
            other => unreachable!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("npm is required"));
    }

    #[test]
    fn failing_version_check_is_unavailable_and_skips_install() {
        let (_dir, targets, pm) = fixture();
        let env = user_env("dev");
        let runner = ScriptedRunner::new(true)
            .version_exiting_with(127)
            .creating(targets.iter().map(Path::to_path_buf).collect());
        let mut log = BuildLog::new();

        let err = Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut log)
            .expect_err("nothing was built");

        assert!(log.contains(Level::ERROR, "`npm` unavailable"));
        assert!(!log.contains(Level::INFO, "Installing build dependencies"));
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["--version"]);
        assert!(!targets.iter().any(Path::exists));
        assert!(matches!(
            err,
            GateError::MissingArtifact {
                unavailable_tool: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn version_check_non_zero_exit_is_unavailable() {
        let pm = PackageManager::new("npm", "js");
        let runner = ScriptedRunner::new(true).version_exiting_with(1);
        let err = pm.probe(&runner).expect_err("non-zero exit");
        assert!(matches!(err, GateError::ToolUnavailable { ref tool } if tool == "npm"));
    }

    #[test]
    fn root_by_uid_gets_unsafe_perm() {
        let (_dir, targets, pm) = fixture();
        let env = Environment {
            path: Some(OsString::from("/usr/bin")),
            user: None,
            uid: Some(0),
        };
        let runner = ScriptedRunner::new(true).creating(targets.iter().map(Path::to_path_buf).collect());
        Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut BuildLog::new())
            .expect("build");

        assert_eq!(runner.calls()[1].args, vec!["install", UNSAFE_PERM_FLAG]);
    }

    #[test]
    fn unavailable_tool_with_prebuilt_targets_succeeds() {
        let (_dir, targets, pm) = fixture();
        for target in targets.iter() {
            std::fs::create_dir_all(target.parent().expect("parent")).expect("mkdir");
            std::fs::write(target, "//").expect("write");
        }
        let env = user_env("dev");
        let runner = ScriptedRunner::new(false);
        let mut log = BuildLog::new();

        let summary = Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut log)
            .expect("targets present");
        assert!(!summary.tool_available);
        assert!(!summary.installed);
        assert_eq!(log.at(Level::ERROR).count(), 1);
    }

    #[test]
    fn failing_install_is_build_failure() {
        let (_dir, targets, pm) = fixture();
        let env = user_env("dev");
        let runner = ScriptedRunner::new(true).failing_with(1);

        let err = Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut BuildLog::new())
            .expect_err("install fails");
        assert!(matches!(err, GateError::BuildFailure { .. }));
        assert!(err.to_string().contains("npm install"));
        assert!(err.to_string().contains("exit status 1"));
    }

    #[test]
    fn installed_targets_missing_names_no_tool() {
        let (_dir, targets, pm) = fixture();
        let env = user_env("dev");
        let runner = ScriptedRunner::new(true);

        let err = Toolchain::new(pm, &targets, &env, &runner)
            .run_external_build(&mut BuildLog::new())
            .expect_err("install produced nothing");
        assert!(matches!(
            err,
            GateError::MissingArtifact {
                unavailable_tool: None,
                ..
            }
        ));
    }

    #[test]
    fn summary_display_reports_what_happened() {
        let full = BuildSummary {
            tool_available: true,
            installed: true,
        };
        let prebuilt = BuildSummary {
            tool_available: false,
            installed: false,
        };
        assert_eq!(full.to_string(), "package manager available, dependencies installed");
        assert_eq!(prebuilt.to_string(), "package manager unavailable, install skipped");
    }

    #[test]
    fn executable_name_is_platform_specific() {
        let pm = PackageManager::new("npm", "js");
        if cfg!(windows) {
            assert_eq!(pm.executable(), "npm.cmd");
        } else {
            assert_eq!(pm.executable(), "npm");
        }
    }
}
