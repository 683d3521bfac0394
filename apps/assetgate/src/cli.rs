//! # CLI Commands
//!
//! One function per packaging command. Each resolves the project, gates the
//! command on the front-end assets and reports the outcome as text or JSON.
//!
//! | Command    | Gate     | Work                                  |
//! |------------|----------|---------------------------------------|
//! | `build`    | lenient  | stage package data under `build/lib`  |
//! | `egg-info` | lenient  | write `<name>.egg-info/`              |
//! | `sdist`    | strict   | stage `dist/<name>-<version>/`        |
//! | `jsdeps`   | none     | install front-end dependencies only   |
//! | `metadata` | none     | print metadata and data-file plan     |

use assetgate_core::{
    AssetBuildGate, BuildLog, BuildOutcome, BuildPy, BuildSummary, CONFIG_FILE, CommandRunner,
    EggInfo, Environment, GateConfig, GateError, PackageLayout, PackageManager, PackagingCommand,
    RepoState, Sdist, Toolchain,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// PROJECT CONTEXT
// =============================================================================

/// Everything resolved once per invocation.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: GateConfig,
    pub env: Environment,
    pub repo: RepoState,
}

impl Project {
    /// Load configuration and decide the repository state.
    ///
    /// `repo_override` beats the config file, which beats probing for `.git`.
    pub fn open(
        root: &Path,
        config_path: Option<&Path>,
        env: Environment,
        repo_override: Option<RepoState>,
    ) -> Result<Self, CliError> {
        let config = GateConfig::load(root, config_path)?;
        let repo = repo_override.unwrap_or_else(|| config.repo_state(root));
        tracing::debug!(root = %root.display(), ?repo, "project opened");
        Ok(Self {
            root: root.to_path_buf(),
            config,
            env,
            repo,
        })
    }

    fn package_manager(&self) -> PackageManager {
        PackageManager::new(
            self.config.package_manager.clone(),
            self.root.join(&self.config.node_root),
        )
    }

    fn layout(&self) -> Result<PackageLayout, CliError> {
        Ok(PackageLayout::load(&self.root, &self.config)?)
    }
}

// =============================================================================
// GATED COMMANDS
// =============================================================================

/// Stage package data, tolerating a failed asset build if assets exist.
pub fn cmd_build<R: CommandRunner>(
    project: &Project,
    runner: &R,
    json: bool,
) -> Result<BuildOutcome, CliError> {
    let mut command = BuildPy::new(project.root.join("build"));
    let outcome = run_gated(project, runner, &mut command)?;
    report(&command, &outcome, json, json!({ "staged": command.staged() }))?;
    Ok(outcome)
}

/// Write egg-info metadata, tolerating a failed asset build if assets exist.
pub fn cmd_egg_info<R: CommandRunner>(
    project: &Project,
    runner: &R,
    json: bool,
) -> Result<BuildOutcome, CliError> {
    let mut command = EggInfo::new();
    let outcome = run_gated(project, runner, &mut command)?;
    let dest = command.egg_dir().map(|p| p.display().to_string());
    report(&command, &outcome, json, json!({ "egg_info": dest }))?;
    Ok(outcome)
}

/// Stage a source tree. Any asset build failure aborts.
pub fn cmd_sdist<R: CommandRunner>(
    project: &Project,
    runner: &R,
    json: bool,
) -> Result<BuildOutcome, CliError> {
    let node_root = &project.config.node_root;
    let mut command = Sdist::new(project.root.join("dist")).with_extra_files([
        PathBuf::from(CONFIG_FILE),
        node_root.join("package.json"),
        node_root.join("package-lock.json"),
    ]);
    let outcome = run_gated(project, runner, &mut command)?;
    report(&command, &outcome, json, json!({ "files": command.manifest() }))?;
    Ok(outcome)
}

fn run_gated<R: CommandRunner>(
    project: &Project,
    runner: &R,
    command: &mut dyn PackagingCommand,
) -> Result<BuildOutcome, CliError> {
    let targets = project.config.build_targets(&project.root);
    let toolchain = Toolchain::new(project.package_manager(), &targets, &project.env, runner);
    let gate = AssetBuildGate::new(project.repo, toolchain);

    let mut layout = project.layout()?;
    let mut log = BuildLog::new();
    Ok(gate.run_gated(&mut layout, command, &mut log)?)
}

fn report(
    command: &dyn PackagingCommand,
    outcome: &BuildOutcome,
    json: bool,
    details: serde_json::Value,
) -> Result<(), CliError> {
    if json {
        let reason = match outcome {
            BuildOutcome::FailedLenient { reason } => Some(reason.as_str()),
            _ => None,
        };
        let out = json!({
            "command": command.name(),
            "assets": outcome.to_string(),
            "reason": reason,
            "details": details,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}: assets {}", command.name(), outcome);
    }
    Ok(())
}

// =============================================================================
// UNGATED COMMANDS
// =============================================================================

/// Install front-end dependencies and verify the build targets.
pub fn cmd_jsdeps<R: CommandRunner>(
    project: &Project,
    runner: &R,
    json: bool,
) -> Result<BuildSummary, CliError> {
    let targets = project.config.build_targets(&project.root);
    let toolchain = Toolchain::new(project.package_manager(), &targets, &project.env, runner);
    let mut log = BuildLog::new();
    let summary = toolchain.run_external_build(&mut log)?;

    // The install may have produced package files; the refreshed scan is
    // what gets reported.
    let mut layout = project.layout()?;
    layout.refresh()?;

    if json {
        let out = json!({
            "command": "jsdeps",
            "tool_available": summary.tool_available,
            "installed": summary.installed,
            "errors": log.at(Level::ERROR).count(),
            "package_files": layout.package_data().len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("jsdeps: {summary}, all {} build target(s) present", targets.len());
    }
    Ok(summary)
}

/// Print resolved metadata and the data-file install plan.
pub fn cmd_metadata(project: &Project, json: bool) -> Result<(), CliError> {
    let layout = project.layout()?;
    let metadata = layout.metadata();

    if json {
        let out = json!({
            "metadata": metadata,
            "data_files": layout.data_files(),
            "package_data": layout.package_data(),
            "build_targets": project.config.targets,
            "repo_state": project.repo,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} {}", metadata.name, metadata.version);
    println!("  {}", metadata.details.description);
    println!("  repo: {:?}", project.repo);
    println!("  data files:");
    for group in layout.data_files() {
        for source in &group.sources {
            println!("    {} -> {}", source.display(), group.dest);
        }
    }
    println!("  package files: {}", layout.package_data().len());
    Ok(())
}
