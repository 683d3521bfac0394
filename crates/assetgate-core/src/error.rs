//! # Error Module
//!
//! Error taxonomy for the asset gate.
//!
//! - `ToolUnavailable`: the package manager could not be reached. The delegate
//!   only logs this; it becomes fatal through `MissingArtifact`.
//! - `BuildFailure`: a child process could not be spawned or exited non-zero.
//! - `MissingArtifact`: declared build targets are absent after a build.
//!
//! The remaining variants cover configuration, version and filesystem input.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while gating or running a packaging command.
#[derive(Debug, Error)]
pub enum GateError {
    /// The package manager executable could not be reached.
    #[error("`{tool}` unavailable")]
    ToolUnavailable { tool: String },

    /// An external build step failed.
    #[error("`{command}` failed: {reason}")]
    BuildFailure { command: String, reason: String },

    /// Build targets still missing after the build attempt.
    #[error("{}", missing_artifact_message(missing, unavailable_tool.as_deref()))]
    MissingArtifact {
        missing: Vec<PathBuf>,
        /// Set when the package manager could not be reached.
        unavailable_tool: Option<String>,
    },

    /// The version file did not contain a recognizable version.
    #[error("cannot read version from {}: {reason}", path.display())]
    VersionParse { path: PathBuf, reason: String },

    /// The configuration file is malformed.
    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Filesystem failure, with the path that was being touched.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl GateError {
    /// Wrap an I/O error with the operation and path it came from.
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context: format!("{action} {}", path.display()),
            source,
        }
    }
}

fn missing_artifact_message(missing: &[PathBuf], unavailable_tool: Option<&str>) -> String {
    let mut msg = String::new();
    for (i, path) in missing.iter().enumerate() {
        if i > 0 {
            msg.push('\n');
        }
        let _ = write!(msg, "Missing file: {}", path.display());
    }
    if let Some(tool) = unavailable_tool {
        let _ = write!(
            msg,
            "\n{tool} is required to build a development version of a widget extension"
        );
    }
    msg
}

// =============================================================================
// TESTS
// =============================================================================
