use super::egg_info::slash;
use super::{PackagingCommand, copy_relative, render_pkg_info, write_file};
use crate::error::GateError;
use crate::layout::PackageLayout;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Stage a source tree under `<dist_dir>/<name>-<version>/`.
///
/// Always strict: a source distribution without its compiled assets is
/// unusable.
#[derive(Debug, Clone)]
pub struct Sdist {
    dist_dir: PathBuf,
    extra: Vec<PathBuf>,
    manifest: Vec<String>,
}

impl Sdist {
    pub fn new(dist_dir: impl Into<PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
            extra: Vec::new(),
            manifest: Vec::new(),
        }
    }

    /// Add project files (relative to the root) included when they exist.
    #[must_use]
    pub fn with_extra_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.extra.extend(files.into_iter().map(Into::into));
        self
    }

    /// Relative paths staged by the last run.
    #[must_use]
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    #[must_use]
    pub fn staging_dir(&self, layout: &PackageLayout) -> PathBuf {
        self.dist_dir.join(layout.fullname())
    }
}

impl PackagingCommand for Sdist {
    fn name(&self) -> &'static str {
        "sdist"
    }

    fn strict(&self) -> bool {
        true
    }

    fn run(&mut self, layout: &PackageLayout) -> Result<(), GateError> {
        let root = layout.root();
        let staging = self.staging_dir(layout);
        if staging.exists() {
            std::fs::remove_dir_all(&staging).map_err(|e| GateError::io("remove", &staging, e))?;
        }

        let mut files: BTreeSet<PathBuf> = layout.package_data().clone();
        for group in layout.data_files() {
            for source in &group.sources {
                include_if_present(root, source, &mut files, true);
            }
        }
        for extra in &self.extra {
            include_if_present(root, extra, &mut files, false);
        }

        for file in &files {
            copy_relative(root, &staging, file)?;
        }
        write_file(&staging.join("PKG-INFO"), &render_pkg_info(layout.metadata()))?;

        self.manifest = files.iter().map(|p| slash(p)).collect();
        let mut listing = self.manifest.join("\n");
        listing.push('\n');
        write_file(&staging.join("MANIFEST"), &listing)?;

        tracing::info!(files = self.manifest.len(), dest = %staging.display(), "staged source tree");
        Ok(())
    }
}

fn include_if_present(root: &Path, file: &Path, files: &mut BTreeSet<PathBuf>, warn: bool) {
    if root.join(file).is_file() {
        files.insert(file.to_path_buf());
    } else if warn {
        tracing::warn!(path = %file.display(), "data file not found, leaving it out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;

    #[test]
    fn stages_tree_with_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pkg = dir.path().join("widget");
        std::fs::create_dir_all(pkg.join("static")).expect("mkdir");
        std::fs::write(pkg.join("_version.py"), "__version__ = '0.3.0'").expect("write");
        std::fs::write(pkg.join("static/extension.js"), "//").expect("write");
        std::fs::write(pkg.join("static/index.js"), "//").expect("write");
        std::fs::write(dir.path().join("widget.json"), "{}").expect("write");
        std::fs::create_dir_all(dir.path().join("js")).expect("mkdir");
        std::fs::write(dir.path().join("js/package.json"), "{}").expect("write");

        let layout =
            PackageLayout::load(dir.path(), &GateConfig::for_package("widget")).expect("layout");
        let mut cmd = Sdist::new(dir.path().join("dist"))
            .with_extra_files(["js/package.json", "assetgate.json"]);
        assert!(cmd.strict());
        cmd.run(&layout).expect("sdist");

        let staging = dir.path().join("dist/widget-0.3.0");
        assert!(staging.join("widget/static/index.js").is_file());
        assert!(staging.join("widget.json").is_file());
        assert!(staging.join("js/package.json").is_file());
        assert!(staging.join("PKG-INFO").is_file());
        assert!(
            !cmd.manifest().iter().any(|f| f.ends_with("index.js.map")),
            "absent map file left out"
        );
        assert!(!cmd.manifest().iter().any(|f| f == "assetgate.json"));

        let listing = std::fs::read_to_string(staging.join("MANIFEST")).expect("read");
        assert_eq!(listing.lines().count(), cmd.manifest().len());
    }

    #[test]
    fn rerun_replaces_previous_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pkg = dir.path().join("widget");
        std::fs::create_dir_all(&pkg).expect("mkdir");
        std::fs::write(pkg.join("_version.py"), "__version__ = '0.3.0'").expect("write");

        let layout =
            PackageLayout::load(dir.path(), &GateConfig::for_package("widget")).expect("layout");
        let stale = dir.path().join("dist/widget-0.3.0/stale.txt");
        std::fs::create_dir_all(stale.parent().expect("parent")).expect("mkdir");
        std::fs::write(&stale, "old").expect("write");

        Sdist::new(dir.path().join("dist")).run(&layout).expect("sdist");
        assert!(!stale.exists());
    }
}
