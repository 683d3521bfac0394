//! # Configuration
//!
//! Everything the gate needs is carried explicitly:
//! - [`GateConfig`]: project layout and metadata, read from `assetgate.json`
//!   at the project root when present, with defaults for the widget otherwise.
//! - [`Environment`]: the slice of the process environment the gate reads,
//!   captured once by the binary. Child-process variables are derived from it
//!   and never written back to the parent process.

use crate::error::GateError;
use crate::repo::RepoState;
use crate::target::BuildTargets;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Configuration file looked up at the project root.
pub const CONFIG_FILE: &str = "assetgate.json";

/// Python package the defaults describe.
pub const DEFAULT_PACKAGE: &str = "ipyparaview";

/// Variables consulted, in order, to name the invoking user.
pub const USER_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

#[cfg(windows)]
const DEFAULT_SEARCH_PATH: &str = ".;C:\\bin";
#[cfg(not(windows))]
const DEFAULT_SEARCH_PATH: &str = "/bin:/usr/bin";

// =============================================================================
// GATE CONFIG
// =============================================================================

/// Project layout. Relative paths are resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Python package directory and distribution name.
    pub package: String,
    /// Directory holding `package.json`.
    pub node_root: PathBuf,
    /// Package manager base name; `.cmd` is appended on Windows.
    pub package_manager: String,
    /// Files whose presence means the front-end is built.
    pub targets: Vec<PathBuf>,
    /// File holding the version assignment.
    pub version_file: PathBuf,
    /// Installed into `share/jupyter/nbextensions/<package>`.
    pub nbextension_files: Vec<PathBuf>,
    /// Installed into `etc/jupyter/nbconfig/notebook.d`.
    pub nbconfig_file: PathBuf,
    /// Forces the repository state instead of probing for `.git`.
    pub repo_state: Option<RepoState>,
    pub metadata: MetadataConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::for_package(DEFAULT_PACKAGE)
    }
}

impl GateConfig {
    /// Conventional layout for a widget package named `package`.
    #[must_use]
    pub fn for_package(package: &str) -> Self {
        let static_dir = PathBuf::from(package).join("static");
        Self {
            package: package.to_string(),
            node_root: PathBuf::from("js"),
            package_manager: "npm".to_string(),
            targets: vec![static_dir.join("extension.js"), static_dir.join("index.js")],
            version_file: PathBuf::from(package).join("_version.py"),
            nbextension_files: vec![
                static_dir.join("extension.js"),
                static_dir.join("index.js"),
                static_dir.join("index.js.map"),
            ],
            nbconfig_file: PathBuf::from(format!("{package}.json")),
            repo_state: None,
            metadata: MetadataConfig::default(),
        }
    }

    /// Load `explicit` if given, else `<root>/assetgate.json` if it exists,
    /// else the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, GateError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE);
                if !candidate.exists() {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text =
            std::fs::read_to_string(&path).map_err(|e| GateError::io("read", &path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| GateError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        config.validate(&path)?;
        tracing::debug!(path = %path.display(), package = %config.package, "loaded config");
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), GateError> {
        let reason = if self.package.trim().is_empty() {
            Some("`package` must not be empty".to_string())
        } else if self.package_manager.trim().is_empty() {
            Some("`package_manager` must not be empty".to_string())
        } else if self.targets.is_empty() {
            Some("`targets` must name at least one file".to_string())
        } else {
            self.staged_paths()
                .find(|(_, p)| !is_project_relative(p))
                .map(|(key, p)| {
                    format!("`{key}` must stay inside the project root, found {}", p.display())
                })
        };
        match reason {
            Some(reason) => Err(GateError::Config {
                path: path.to_path_buf(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Paths that are copied into staging trees, keyed by config field.
    fn staged_paths(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        std::iter::once(("node_root", self.node_root.as_path()))
            .chain(std::iter::once(("nbconfig_file", self.nbconfig_file.as_path())))
            .chain(
                self.nbextension_files
                    .iter()
                    .map(|p| ("nbextension_files", p.as_path())),
            )
    }

    /// Build targets resolved against `root`.
    #[must_use]
    pub fn build_targets(&self, root: &Path) -> BuildTargets {
        BuildTargets::new(self.targets.iter().cloned()).resolved_against(root)
    }

    /// Repository state, honouring the override.
    #[must_use]
    pub fn repo_state(&self, root: &Path) -> RepoState {
        self.repo_state.unwrap_or_else(|| RepoState::detect(root))
    }
}

/// Relative, with no `..` step out of the root.
fn is_project_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Descriptive package metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub description: String,
    pub long_description: String,
    pub install_requires: Vec<String>,
    pub author: String,
    pub author_email: String,
    pub url: String,
    pub keywords: Vec<String>,
    pub classifiers: Vec<String>,
    pub zip_safe: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        let description = "A widget for interactive server-side ParaView rendering".to_string();
        Self {
            long_description: description.clone(),
            description,
            install_requires: vec![
                "ipywidgets>=7.0.0".to_string(),
                "pillow>=7.0.0".to_string(),
                "numpy".to_string(),
            ],
            author: "Nick Leaf".to_string(),
            author_email: "nleaf@nvidia.com".to_string(),
            url: "https://github.com/NVIDIA/ipyparaview".to_string(),
            keywords: vec![
                "ipython".to_string(),
                "jupyter".to_string(),
                "widgets".to_string(),
            ],
            classifiers: [
                "Development Status :: 4 - Beta",
                "Framework :: IPython",
                "Intended Audience :: Developers",
                "Intended Audience :: Science/Research",
                "Topic :: Multimedia :: Graphics",
                "Programming Language :: Python :: 2",
                "Programming Language :: Python :: 2.7",
                "Programming Language :: Python :: 3",
                "Programming Language :: Python :: 3.3",
                "Programming Language :: Python :: 3.4",
                "Programming Language :: Python :: 3.5",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            zip_safe: false,
        }
    }
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Snapshot of the process environment relevant to the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `PATH`, if set.
    pub path: Option<OsString>,
    /// First of `LOGNAME`, `USER`, `LNAME`, `USERNAME` that is set.
    pub user: Option<String>,
    /// Effective uid, where the platform has one.
    pub uid: Option<u32>,
}

impl Environment {
    /// Read the current process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            path: std::env::var_os("PATH"),
            user: USER_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty())),
            uid: effective_uid(),
        }
    }

    /// The user variables decide when one is set; otherwise uid 0 is root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        match self.user.as_deref() {
            Some(user) => user == "root",
            None => self.uid == Some(0),
        }
    }

    /// Search path for a child process with `dir` placed first.
    ///
    /// Falls back to the platform default search path when `PATH` is unset.
    pub fn search_path_with(&self, dir: &Path) -> Result<OsString, GateError> {
        let base = self
            .path
            .clone()
            .unwrap_or_else(|| OsString::from(DEFAULT_SEARCH_PATH));
        let entries = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&base));
        std::env::join_paths(entries).map_err(|e| GateError::Config {
            path: dir.to_path_buf(),
            reason: format!("cannot place on PATH: {e}"),
        })
    }
}

#[cfg(unix)]
fn effective_uid() -> Option<u32> {
    Some(nix::unistd::Uid::effective().as_raw())
}

#[cfg(not(unix))]
fn effective_uid() -> Option<u32> {
    None
}

// =============================================================================
// TESTS
// =============================================================================
