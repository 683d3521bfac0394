//! # Packaging Commands
//!
//! The commands the asset gate wraps. Each is a plain filesystem operation
//! over a [`PackageLayout`]:
//! - `build_py`: stage package data for installation
//! - `egg_info`: write distribution metadata
//! - `sdist`: stage a source tree with a manifest
//!
//! Archiving and installation are left to the Python tooling downstream.

mod build_py;
mod egg_info;
mod sdist;

pub use build_py::BuildPy;
pub use egg_info::{EggInfo, render_pkg_info};
pub use sdist::Sdist;

use crate::error::GateError;
use crate::layout::PackageLayout;
use std::path::Path;

/// A command that can be run behind the asset gate.
pub trait PackagingCommand {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Whether an asset build failure must abort this command.
    fn strict(&self) -> bool {
        false
    }

    fn run(&mut self, layout: &PackageLayout) -> Result<(), GateError>;
}

/// Copy `relative` from `src_root` to `dst_root`, creating parent directories.
fn copy_relative(src_root: &Path, dst_root: &Path, relative: &Path) -> Result<(), GateError> {
    let src = src_root.join(relative);
    let dst = dst_root.join(relative);
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GateError::io("create", parent, e))?;
    }
    std::fs::copy(&src, &dst).map_err(|e| GateError::io("copy", &src, e))?;
    Ok(())
}

/// Write `contents` to `path`, creating parent directories.
fn write_file(path: &Path, contents: &str) -> Result<(), GateError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GateError::io("create", parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| GateError::io("write", path, e))
}
