use super::{PackagingCommand, copy_relative};
use crate::error::GateError;
use crate::layout::PackageLayout;
use std::path::PathBuf;

/// Stage package data under `<build_dir>/lib`.
#[derive(Debug, Clone)]
pub struct BuildPy {
    build_dir: PathBuf,
    staged: usize,
}

impl BuildPy {
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            staged: 0,
        }
    }

    #[must_use]
    pub fn lib_dir(&self) -> PathBuf {
        self.build_dir.join("lib")
    }

    /// Files copied by the last run.
    #[must_use]
    pub fn staged(&self) -> usize {
        self.staged
    }
}

impl PackagingCommand for BuildPy {
    fn name(&self) -> &'static str {
        "build_py"
    }

    fn run(&mut self, layout: &PackageLayout) -> Result<(), GateError> {
        let lib = self.lib_dir();
        for file in layout.package_data() {
            copy_relative(layout.root(), &lib, file)?;
        }
        self.staged = layout.package_data().len();
        tracing::info!(files = self.staged, dest = %lib.display(), "staged package data");
        Ok(())
    }
}
