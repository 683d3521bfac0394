//! # Build Targets
//!
//! The compiled asset files whose presence signals that the front-end has been
//! built. Declaration order is preserved so that error messages and logs list
//! files the way the configuration names them.

use std::path::{Path, PathBuf};

/// Ordered, duplicate-free set of expected build outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTargets {
    paths: Vec<PathBuf>,
}

impl BuildTargets {
    /// Create a target set, dropping later duplicates.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut out: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.into();
            if !out.contains(&path) {
                out.push(path);
            }
        }
        Self { paths: out }
    }

    /// Resolve relative targets against `root`.
    #[must_use]
    pub fn resolved_against(&self, root: &Path) -> Self {
        Self::new(self.paths.iter().map(|p| root.join(p)))
    }

    /// Targets that do not currently exist on disk, in declaration order.
    #[must_use]
    pub fn missing(&self) -> Vec<PathBuf> {
        self.paths.iter().filter(|p| !p.exists()).cloned().collect()
    }

    /// True when every target exists.
    #[must_use]
    pub fn all_present(&self) -> bool {
        self.paths.iter().all(|p| p.exists())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
