//! # Package Layout
//!
//! The packaging view of the project: descriptive metadata, the data files
//! installed outside the Python package (notebook extension scripts and the
//! notebook config snippet), and the package data discovered on disk.
//!
//! Package data is a snapshot. A build can create new files under the package
//! (the bundled scripts land in `<package>/static`), so gated commands call
//! [`PackageLayout::refresh`] afterwards to pick them up.

use crate::config::{GateConfig, MetadataConfig};
use crate::error::GateError;
use crate::version::read_version;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Install prefix for notebook extension scripts; the package name is appended.
pub const NBEXTENSION_PREFIX: &str = "share/jupyter/nbextensions";

/// Install directory for notebook config snippets.
pub const NBCONFIG_DEST: &str = "etc/jupyter/nbconfig/notebook.d";

/// Files installed together under one destination directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataFiles {
    pub dest: String,
    pub sources: Vec<PathBuf>,
}

/// Resolved distribution metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub details: MetadataConfig,
}

#[derive(Debug, Clone)]
pub struct PackageLayout {
    root: PathBuf,
    package: String,
    metadata: PackageMetadata,
    data_files: Vec<DataFiles>,
    package_data: BTreeSet<PathBuf>,
}

impl PackageLayout {
    /// Read the version and scan the package directory.
    pub fn load(root: &Path, config: &GateConfig) -> Result<Self, GateError> {
        let version = read_version(&root.join(&config.version_file))?;
        let data_files = vec![
            DataFiles {
                dest: format!("{NBEXTENSION_PREFIX}/{}", config.package),
                sources: config.nbextension_files.clone(),
            },
            DataFiles {
                dest: NBCONFIG_DEST.to_string(),
                sources: vec![config.nbconfig_file.clone()],
            },
        ];

        let mut layout = Self {
            root: root.to_path_buf(),
            package: config.package.clone(),
            metadata: PackageMetadata {
                name: config.package.clone(),
                version,
                details: config.metadata.clone(),
            },
            data_files,
            package_data: BTreeSet::new(),
        };
        layout.refresh()?;
        Ok(layout)
    }

    /// Re-scan package data. Returns how many files were not seen before.
    pub fn refresh(&mut self) -> Result<usize, GateError> {
        let mut found = BTreeSet::new();
        let package_dir = self.package_dir();
        if package_dir.is_dir() {
            scan(&self.root, &package_dir, &mut found)?;
        } else {
            tracing::warn!(path = %package_dir.display(), "package directory not found");
        }

        let added = found.difference(&self.package_data).count();
        if added > 0 {
            tracing::debug!(added, "package data refreshed");
        }
        self.package_data = found;
        Ok(added)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    #[must_use]
    pub fn package_dir(&self) -> PathBuf {
        self.root.join(&self.package)
    }

    #[must_use]
    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn data_files(&self) -> &[DataFiles] {
        &self.data_files
    }

    /// Package files relative to the project root, sorted.
    #[must_use]
    pub fn package_data(&self) -> &BTreeSet<PathBuf> {
        &self.package_data
    }

    /// `<name>-<version>`.
    #[must_use]
    pub fn fullname(&self) -> String {
        format!("{}-{}", self.metadata.name, self.metadata.version)
    }
}

fn scan(root: &Path, dir: &Path, out: &mut BTreeSet<PathBuf>) -> Result<(), GateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| GateError::io("scan", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| GateError::io("scan", dir, e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| GateError::io("stat", &path, e))?;

        if file_type.is_dir() {
            if entry.file_name() != "__pycache__" {
                scan(root, &path, out)?;
            }
        } else if path.extension().is_none_or(|ext| ext != "pyc") {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            out.insert(relative);
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
