use super::{PackagingCommand, write_file};
use crate::error::GateError;
use crate::layout::{PackageLayout, PackageMetadata};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Write `<name>.egg-info/` metadata next to the package.
#[derive(Debug, Clone, Default)]
pub struct EggInfo {
    written: Option<PathBuf>,
}

impl EggInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory written by the last run.
    #[must_use]
    pub fn egg_dir(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl PackagingCommand for EggInfo {
    fn name(&self) -> &'static str {
        "egg_info"
    }

    fn run(&mut self, layout: &PackageLayout) -> Result<(), GateError> {
        let metadata = layout.metadata();
        let dir = layout
            .root()
            .join(format!("{}.egg-info", metadata.name.replace('-', "_")));

        write_file(&dir.join("PKG-INFO"), &render_pkg_info(metadata))?;
        write_file(&dir.join("SOURCES.txt"), &lines(sources(layout)))?;
        write_file(&dir.join("top_level.txt"), &lines([layout.package().to_string()]))?;
        write_file(
            &dir.join("requires.txt"),
            &lines(metadata.details.install_requires.iter().cloned()),
        )?;
        if !metadata.details.zip_safe {
            write_file(&dir.join("not-zip-safe"), "\n")?;
        }

        tracing::info!(dest = %dir.display(), "wrote egg-info");
        self.written = Some(dir);
        Ok(())
    }
}

/// Core metadata in `PKG-INFO` form.
#[must_use]
pub fn render_pkg_info(metadata: &PackageMetadata) -> String {
    let details = &metadata.details;
    let mut out = String::new();
    out.push_str("Metadata-Version: 2.1\n");
    out.push_str(&format!("Name: {}\n", metadata.name));
    out.push_str(&format!("Version: {}\n", metadata.version));
    out.push_str(&format!("Summary: {}\n", details.description));
    out.push_str(&format!("Home-page: {}\n", details.url));
    out.push_str(&format!("Author: {}\n", details.author));
    out.push_str(&format!("Author-email: {}\n", details.author_email));
    if !details.keywords.is_empty() {
        out.push_str(&format!("Keywords: {}\n", details.keywords.join(",")));
    }
    for classifier in &details.classifiers {
        out.push_str(&format!("Classifier: {classifier}\n"));
    }
    for requirement in &details.install_requires {
        out.push_str(&format!("Requires-Dist: {requirement}\n"));
    }
    out.push('\n');
    out.push_str(&details.long_description);
    out.push('\n');
    out
}

/// Package data plus data-file sources that exist, slash-separated, sorted.
fn sources(layout: &PackageLayout) -> BTreeSet<String> {
    let mut out: BTreeSet<String> = layout.package_data().iter().map(|p| slash(p)).collect();
    for group in layout.data_files() {
        for source in &group.sources {
            if layout.root().join(source).is_file() {
                out.insert(slash(source));
            }
        }
    }
    out
}

pub(crate) fn slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn lines(items: impl IntoIterator<Item = String>) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&item);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;

    fn layout() -> (tempfile::TempDir, PackageLayout) {
        let dir = tempfile::tempdir().expect("tempdir");
        let pkg = dir.path().join("my-widget");
        std::fs::create_dir_all(pkg.join("static")).expect("mkdir");
        std::fs::write(pkg.join("_version.py"), "__version__ = '2.0.1'").expect("write");
        std::fs::write(pkg.join("static/index.js"), "//").expect("write");
        std::fs::write(dir.path().join("my-widget.json"), "{}").expect("write");
        let layout =
            PackageLayout::load(dir.path(), &GateConfig::for_package("my-widget")).expect("layout");
        (dir, layout)
    }

    #[test]
    fn writes_metadata_files() {
        let (dir, layout) = layout();
        let mut cmd = EggInfo::new();
        cmd.run(&layout).expect("egg_info");

        let egg = dir.path().join("my_widget.egg-info");
        assert_eq!(cmd.egg_dir(), Some(egg.as_path()));

        let pkg_info = std::fs::read_to_string(egg.join("PKG-INFO")).expect("read");
        assert!(pkg_info.contains("Name: my-widget\n"));
        assert!(pkg_info.contains("Version: 2.0.1\n"));
        assert!(pkg_info.contains("Requires-Dist: ipywidgets>=7.0.0\n"));

        let sources = std::fs::read_to_string(egg.join("SOURCES.txt")).expect("read");
        assert_eq!(
            sources,
            "my-widget.json\nmy-widget/_version.py\nmy-widget/static/index.js\n"
        );
        assert_eq!(
            std::fs::read_to_string(egg.join("top_level.txt")).expect("read"),
            "my-widget\n"
        );
        assert!(egg.join("not-zip-safe").exists());
    }

    #[test]
    fn pkg_info_lists_classifiers_in_order() {
        let (_dir, layout) = layout();
        let text = render_pkg_info(layout.metadata());
        let first = text.find("Classifier: Development Status").expect("first");
        let last = text.find("Classifier: Programming Language").expect("last");
        assert!(first < last);
        assert!(text.contains("Keywords: ipython,jupyter,widgets\n"));
    }
}
