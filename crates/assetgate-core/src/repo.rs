//! # Repository State
//!
//! Distinguishes a development checkout, where assets may be stale or absent,
//! from an unpacked release artifact, where assets ship pre-built.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the version-control metadata entry that marks a checkout.
pub const VCS_MARKER: &str = ".git";

/// Where the project tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepoState {
    DevelopmentCheckout,
    ReleaseArtifact,
}

impl RepoState {
    /// Inspect `root` for version-control metadata.
    ///
    /// `.git` may be a directory or, for worktrees and submodules, a file.
    #[must_use]
    pub fn detect(root: &Path) -> Self {
        if root.join(VCS_MARKER).exists() {
            Self::DevelopmentCheckout
        } else {
            Self::ReleaseArtifact
        }
    }

    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, Self::DevelopmentCheckout)
    }
}
