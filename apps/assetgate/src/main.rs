//! assetgate - packaging commands for the notebook rendering widget.
//!
//! Every packaging command first makes sure the widget's compiled front-end
//! assets exist, building them with the package manager when needed.

use assetgate::cli::{
    CliError, Project, cmd_build, cmd_egg_info, cmd_jsdeps, cmd_metadata, cmd_sdist,
};
use assetgate_core::{Environment, ProcessRunner, RepoState};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "assetgate", version, about = "Notebook widget packaging with front-end asset gating")]
struct Cli {
    /// Project root (the directory holding the package and `js/`).
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (defaults to `<root>/assetgate.json` if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Treat the tree as a release artifact even if `.git` exists.
    #[arg(long, global = true, conflicts_with = "dev")]
    release: bool,

    /// Treat the tree as a development checkout even without `.git`.
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stage package data under build/lib (asset build failures tolerated)
    Build,
    /// Stage a source distribution tree (asset build failures abort)
    Sdist,
    /// Write egg-info metadata (asset build failures tolerated)
    EggInfo,
    /// Install front-end dependencies and verify build targets
    Jsdeps,
    /// Show package metadata and the data-file install plan
    Metadata,
}

impl Cli {
    fn repo_override(&self) -> Option<RepoState> {
        if self.release {
            Some(RepoState::ReleaseArtifact)
        } else if self.dev {
            Some(RepoState::DevelopmentCheckout)
        } else {
            None
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries command output; diagnostics go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    tracing::debug!(root = %cli.root.display(), "assetgate entered");
    let env = Environment::capture();
    if let Some(path) = &env.path {
        tracing::debug!("$PATH={}", path.to_string_lossy());
    }

    let project = Project::open(&cli.root, cli.config.as_deref(), env, cli.repo_override())?;
    let runner = ProcessRunner;

    match cli.command {
        Commands::Build => cmd_build(&project, &runner, cli.json).map(|_| ()),
        Commands::Sdist => cmd_sdist(&project, &runner, cli.json).map(|_| ()),
        Commands::EggInfo => cmd_egg_info(&project, &runner, cli.json).map(|_| ()),
        Commands::Jsdeps => cmd_jsdeps(&project, &runner, cli.json).map(|_| ()),
        Commands::Metadata => cmd_metadata(&project, cli.json),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
