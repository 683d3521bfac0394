//! # assetgate-core
//!
//! Makes sure a notebook widget's compiled front-end assets exist before a
//! packaging command runs.
//!
//! ## Pieces
//!
//! - [`AssetBuildGate`]: skip, build, tolerate or abort, per command
//! - [`Toolchain`]: probe the package manager, install, verify targets
//! - [`CommandRunner`]: the only place child processes are spawned
//! - [`PackageLayout`]: metadata, data files and package data
//! - [`commands`]: `build_py`, `egg_info`, `sdist`
//!
//! Configuration ([`GateConfig`]) and the process environment
//! ([`Environment`]) are passed in explicitly.

pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod journal;
pub mod layout;
pub mod repo;
pub mod runner;
pub mod target;
pub mod toolchain;
pub mod version;

pub use commands::{BuildPy, EggInfo, PackagingCommand, Sdist};
pub use config::{CONFIG_FILE, Environment, GateConfig, MetadataConfig};
pub use error::GateError;
pub use gate::{AssetBuildGate, BuildOutcome};
pub use journal::{BuildLog, LogEntry};
pub use layout::{DataFiles, PackageLayout, PackageMetadata};
pub use repo::RepoState;
pub use runner::{CommandRunner, Invocation, ProcessRunner, RunStatus};
pub use target::BuildTargets;
pub use toolchain::{BuildSummary, PackageManager, Toolchain};
pub use version::read_version;
