//! Package descriptors from the registry.
//!
//! A descriptor lives at `<registry>/<name>/<name>.config`:
//!
//! ```text
//! [package]
//! repository = https://github.com/glfw/glfw.git
//! commit = 3.3.8
//!
//! [core]
//!
//! [headers]
//! interface = true
//! ```
//!
//! The `[package]` section describes the package itself. Every other
//! top-level section declares a sub-package named `<name>_<section>` that
//! shares the parent's sources and cache directory.

use std::path::Path;

use crate::core::error::ConfigError;
use crate::core::section::{Document, Section};
use crate::core::Package;
use crate::sources::CacheLayout;

/// The section describing the package itself.
pub const PACKAGE_SECTION: &str = "package";

const PACKAGE_KEYS: &[&str] = &["repository", "commit", "interface"];
const SUBPACKAGE_KEYS: &[&str] = &["interface"];

/// Locate, parse and project the descriptor of `name`.
pub fn load_descriptor(layout: &CacheLayout, name: &str) -> Result<Package, ConfigError> {
    let path = layout.descriptor_path(name);
    let doc = Document::load(&path)?;
    package_from_document(name, &layout.package_dir(name), &path, &doc)
}

/// Project a parsed descriptor into a [`Package`].
///
/// `path` names the descriptor in error messages. A package without a
/// repository takes its sources from the directory holding `path`.
pub fn package_from_document(
    name: &str,
    location: &Path,
    path: &Path,
    doc: &Document,
) -> Result<Package, ConfigError> {
    let section = doc
        .get(PACKAGE_SECTION)
        .ok_or_else(|| ConfigError::MissingSection {
            path: path.to_path_buf(),
            section: PACKAGE_SECTION.to_string(),
        })?;
    warn_unknown_keys(path, section, PACKAGE_KEYS);

    let mut package = Package::new(name, location)
        .with_repository(section.get("repository").unwrap_or_default())
        .with_commit(section.get("commit").unwrap_or_default())
        .with_interface(bool_key(path, section, "interface")?.unwrap_or(false));

    let local_sources = match package.repository() {
        Some(_) => None,
        None => path.parent().map(Path::to_path_buf),
    };
    if let Some(dir) = &local_sources {
        tracing::debug!("{} has no repository; using sources in {}", name, dir.display());
        package = package.with_local_sources(dir);
    }

    for sub in doc.sections().filter(|s| s.name() != PACKAGE_SECTION) {
        warn_unknown_keys(path, sub, SUBPACKAGE_KEYS);
        let interface = bool_key(path, sub, "interface")?.unwrap_or(false);
        let mut subpackage =
            Package::new(format!("{}_{}", name, sub.name()), location).with_interface(interface);
        if let Some(dir) = &local_sources {
            subpackage = subpackage.with_local_sources(dir);
        }
        package.add_subpackage(subpackage);
    }

    Ok(package)
}

/// Parse a boolean literal. Only `true` and `false` are accepted.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Read an optional boolean key, failing on anything but `true`/`false`.
pub(crate) fn bool_key(
    path: &Path,
    section: &Section,
    key: &str,
) -> Result<Option<bool>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(value) => parse_bool(value)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                path: path.to_path_buf(),
                section: section.name().to_string(),
                key: key.to_string(),
                value: value.to_string(),
            }),
    }
}

pub(crate) fn warn_unknown_keys(path: &Path, section: &Section, known: &[&str]) {
    for (key, _) in section.entries() {
        if !known.contains(&key) {
            tracing::warn!(
                "ignoring unknown key `{}` in [{}] of {}",
                key,
                section.name(),
                path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PackageState;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn project(name: &str, text: &str) -> Result<Package, ConfigError> {
        let doc: Document = text.parse().unwrap();
        let path = PathBuf::from(format!("packages/{0}/{0}.config", name));
        package_from_document(name, &Path::new("cache").join(name), &path, &doc)
    }

    #[test]
    fn test_plain_package() {
        let pkg = project("foo", "[package]\nrepository = git://x/foo\ninterface = false\n").unwrap();

        assert_eq!(pkg.name(), "foo");
        assert_eq!(pkg.repository(), Some("git://x/foo"));
        assert_eq!(pkg.commit(), None);
        assert!(!pkg.is_interface());
        assert_eq!(pkg.location(), Path::new("cache/foo"));
        assert_eq!(pkg.source_dir(), Path::new("cache/foo/repository"));
        assert_eq!(pkg.state(), PackageState::None);
        assert!(!pkg.has_subpackages());
    }

    #[test]
    fn test_defaults() {
        let pkg = project("local", "[package]\n").unwrap();
        assert_eq!(pkg.repository(), None);
        assert!(!pkg.is_interface());
        assert_eq!(pkg.source_dir(), Path::new("packages/local"));
    }

    #[test]
    fn test_pinned_commit() {
        let pkg = project("glfw", "[package]\nrepository = git://x/glfw\ncommit = 3.3.8\n").unwrap();
        assert_eq!(pkg.commit(), Some("3.3.8"));
    }

    #[test]
    fn test_subpackages() {
        let pkg = project(
            "glfw",
            "[core]\n[package]\nrepository = git://x/glfw\n[headers]\ninterface = true\n",
        )
        .unwrap();

        let names: Vec<_> = pkg.subpackages().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["glfw_core", "glfw_headers"]);

        let headers = pkg.subpackage("glfw_headers").unwrap();
        assert!(headers.is_interface());
        assert_eq!(headers.location(), pkg.location());
        assert!(!pkg.subpackage("glfw_core").unwrap().is_interface());
    }

    #[test]
    fn test_local_subpackages_share_registry_sources() {
        let pkg = project("util", "[package]
[headers]
interface = true
").unwrap();

        let headers = pkg.subpackage("util_headers").unwrap();
        assert_eq!(
            headers.interface_include_dir(),
            Path::new("packages/util/include")
        );
    }

    #[test]
    fn test_missing_package_section() {
        let err = project("foo", "[core]\ninterface = true\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSection { ref section, .. } if section == "package"
        ));
    }

    #[test]
    fn test_invalid_boolean() {
        for value in ["yes", "1", "True", "TRUE", ""] {
            let text = format!("[package]\ninterface = {}\n", value);
            let err = project("foo", &text).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "interface"),
                "value: {:?}",
                value
            );
        }

        let err = project("foo", "[package]\n[core]\ninterface = maybe\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref section, .. } if section == "core"
        ));
    }

    #[test]
    fn test_load_from_registry() {
        let tmp = TempDir::new().unwrap();
        let layout = CacheLayout::new(tmp.path().join("packages"), tmp.path().join("cache"));
        fs::create_dir_all(layout.registry_dir("glm")).unwrap();
        fs::write(
            layout.descriptor_path("glm"),
            "[package]\nrepository = https://github.com/g-truc/glm.git\ninterface = true\n",
        )
        .unwrap();

        let pkg = load_descriptor(&layout, "glm").unwrap();
        assert!(pkg.is_interface());
        assert_eq!(pkg.location(), layout.package_dir("glm"));
    }

    #[test]
    fn test_load_missing_descriptor() {
        let tmp = TempDir::new().unwrap();
        let layout = CacheLayout::new(tmp.path().join("packages"), tmp.path().join("cache"));
        fs::create_dir_all(layout.registry_dir("glm")).unwrap();

        let err = load_descriptor(&layout, "glm").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
