//! The project manifest, `narcpm.config`.
//!
//! Each top-level section imports one registry package; nested sections
//! select individual sub-packages of a container package:
//!
//! ```text
//! [glm]
//!
//! [glfw]
//! static = false
//! update = true
//!
//! [glfw.core]
//! ```
//!
//! Recognized keys are `static` (link statically, default `true`) and
//! `update` (pull the repository on every run, default `false`). A
//! sub-package import inherits the parent's `static` flag unless it sets
//! its own.

use std::path::{Path, PathBuf};

use crate::core::descriptor::{bool_key, warn_unknown_keys};
use crate::core::error::ConfigError;
use crate::core::section::{Document, Section};

/// File name of the project manifest inside the project root.
pub const MANIFEST_NAME: &str = "narcpm.config";

const IMPORT_KEYS: &[&str] = &["static", "update"];
const SUBIMPORT_KEYS: &[&str] = &["static"];

/// A request for one sub-package of an imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubImport {
    /// Section name in the descriptor (`core` for `glfw_core`).
    pub name: String,

    pub link_static: bool,
}

impl SubImport {
    /// Full package name of the requested sub-package.
    pub fn package_name(&self, parent: &str) -> String {
        format!("{}_{}", parent, self.name)
    }
}

/// A consuming project's request to use a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: String,

    /// Link statically (`true`) or as a shared library.
    pub link_static: bool,

    /// Pull the latest sources even when already cloned.
    pub update: bool,

    /// Requested sub-packages in manifest order. Empty means "all".
    pub subpackages: Vec<SubImport>,
}

impl Import {
    pub fn new(name: impl Into<String>) -> Self {
        Import {
            name: name.into(),
            link_static: true,
            update: false,
            subpackages: Vec::new(),
        }
    }

    pub fn shared(mut self) -> Self {
        self.link_static = false;
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn with_subpackage(mut self, name: impl Into<String>, link_static: bool) -> Self {
        self.subpackages.push(SubImport {
            name: name.into(),
            link_static,
        });
        self
    }
}

/// The parsed project manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    imports: Vec<Import>,
}

impl Manifest {
    /// Load `<project_root>/narcpm.config`.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        if !project_root.is_dir() {
            return Err(ConfigError::DirectoryNotFound {
                path: project_root.to_path_buf(),
            });
        }

        let path = project_root.join(MANIFEST_NAME);
        let doc = Document::load(&path)?;
        Manifest::from_document(&path, &doc)
    }

    /// Map every top-level section of `doc` to an [`Import`].
    pub fn from_document(path: &Path, doc: &Document) -> Result<Self, ConfigError> {
        let imports = doc
            .sections()
            .map(|section| import_from_section(path, section))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Manifest {
            path: path.to_path_buf(),
            imports,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Imports in manifest order.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Keep only imports the registry knows about.
    ///
    /// Unknown packages are dropped silently; `exists` is asked once per
    /// import, in manifest order.
    pub fn into_registered(self, mut exists: impl FnMut(&str) -> bool) -> Vec<Import> {
        self.imports
            .into_iter()
            .filter(|import| exists(&import.name))
            .collect()
    }
}

fn import_from_section(path: &Path, section: &Section) -> Result<Import, ConfigError> {
    warn_unknown_keys(path, section, IMPORT_KEYS);

    let link_static = bool_key(path, section, "static")?.unwrap_or(true);
    let update = bool_key(path, section, "update")?.unwrap_or(false);

    let subpackages = section
        .subsections()
        .map(|sub| {
            warn_unknown_keys(path, sub, SUBIMPORT_KEYS);
            Ok(SubImport {
                name: sub.name().to_string(),
                link_static: bool_key(path, sub, "static")?.unwrap_or(link_static),
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(Import {
        name: section.name().to_string(),
        link_static,
        update,
        subpackages,
    })
}
