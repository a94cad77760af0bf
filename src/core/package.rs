//! Package - a registry entry projected into the build model.
//!
//! Packages are rebuilt from registry descriptors on every run. Progress is
//! never stored in memory between runs; it lives in sentinel files under the
//! cache (see [`crate::sources::layout`]).

use std::fmt;
use std::path::{Path, PathBuf};

/// How far a package has progressed through the cache.
///
/// The ordering is the lifecycle order; within a run a package only moves
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum PackageState {
    #[default]
    None,
    Cloned,
    Built,
}

impl PackageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageState::None => "none",
            PackageState::Cloned => "cloned",
            PackageState::Built => "built",
        }
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package, or one sub-package of a container package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    repository: Option<String>,
    commit: Option<String>,
    interface: bool,
    location: PathBuf,
    local_sources: Option<PathBuf>,
    state: PackageState,
    subpackages: Vec<Package>,
}

impl Package {
    /// Create a package rooted at `location` (normally `<cache>/<name>`).
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Package {
            name: name.into(),
            repository: None,
            commit: None,
            interface: false,
            location: location.into(),
            local_sources: None,
            state: PackageState::None,
            subpackages: Vec::new(),
        }
    }

    /// Set the repository URL. Empty strings mean "no repository".
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        let repository = repository.into();
        self.repository = (!repository.is_empty()).then_some(repository);
        self
    }

    /// Pin a commit or ref. Empty strings mean "unpinned".
    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        let commit = commit.into();
        self.commit = (!commit.is_empty()).then_some(commit);
        self
    }

    pub fn with_interface(mut self, interface: bool) -> Self {
        self.interface = interface;
        self
    }

    /// Sources that live in the registry instead of a cloned repository.
    pub fn with_local_sources(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_sources = Some(dir.into());
        self
    }

    /// Add a sub-package. A repeated name replaces the earlier declaration.
    pub fn add_subpackage(&mut self, sub: Package) {
        match self.subpackages.iter_mut().find(|p| p.name == sub.name) {
            Some(existing) => *existing = sub,
            None => self.subpackages.push(sub),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Repository URL; `None` means build from local sources only.
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// Header-only: no binary artifact.
    pub fn is_interface(&self) -> bool {
        self.interface
    }

    /// Cache directory of the package (shared by its sub-packages).
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn state(&self) -> PackageState {
        self.state
    }

    /// Move the state forward. Requests to move backwards are ignored.
    pub fn advance(&mut self, state: PackageState) {
        if state > self.state {
            tracing::debug!("{}: {} -> {}", self.name, self.state, state);
            self.state = state;
        }
    }

    /// Sub-packages in declaration order.
    pub fn subpackages(&self) -> &[Package] {
        &self.subpackages
    }

    /// Look up a sub-package by its full name (`<package>_<section>`).
    pub fn subpackage(&self, name: &str) -> Option<&Package> {
        self.subpackages.iter().find(|p| p.name == name)
    }

    pub fn has_subpackages(&self) -> bool {
        !self.subpackages.is_empty()
    }

    /// Whether any leaf of this package produces a binary artifact.
    ///
    /// A package with sub-packages is a container: only its sub-packages'
    /// interface flags count.
    pub fn needs_build(&self) -> bool {
        if self.subpackages.is_empty() {
            !self.interface
        } else {
            self.subpackages.iter().any(|p| !p.interface)
        }
    }

    /// Where the repository is cloned.
    pub fn repository_dir(&self) -> PathBuf {
        self.location.join("repository")
    }

    /// Root of the per-variant build trees.
    pub fn build_dir(&self) -> PathBuf {
        self.location.join("build")
    }

    /// The `.built` sentinel marker.
    pub fn built_marker(&self) -> PathBuf {
        self.location.join(".built")
    }

    /// Installed headers of a compiled package.
    pub fn include_dir(&self) -> PathBuf {
        self.location.join("include")
    }

    /// Source tree of the package: the registry directory of a local-only
    /// package, otherwise the clone.
    pub fn source_dir(&self) -> PathBuf {
        match &self.local_sources {
            Some(dir) => dir.clone(),
            None => self.repository_dir(),
        }
    }

    /// Headers of a header-only package, straight from its sources.
    pub fn interface_include_dir(&self) -> PathBuf {
        self.source_dir().join("include")
    }

    /// Installed libraries, one subdirectory per toolchain and build type.
    pub fn lib_dir(&self) -> PathBuf {
        self.location.join("lib")
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
