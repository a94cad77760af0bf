//! On-disk layout of the registry and the cache, and the state probes.
//!
//! ```text
//! <registry>/
//! └── <name>/
//!     ├── <name>.config        # package descriptor
//!     └── CMakeLists.txt       # build recipe for the cached sources
//! <cache>/
//! └── <name>/
//!     ├── repository/          # cloned sources
//!     ├── build/<toolchain>/<build-type>/<link-type>/
//!     ├── include/             # installed headers
//!     ├── lib/<toolchain>/<build-type>/lib<name>.{a,so}
//!     └── .built               # sentinel: every variant built
//! ```
//!
//! The probes are plain filesystem checks and are re-evaluated every run.

use std::path::{Path, PathBuf};

use crate::core::PackageState;

/// File extension of package descriptors in the registry.
pub const DESCRIPTOR_EXTENSION: &str = "config";

/// Name of the sentinel marker inside a package's cache directory.
pub const BUILT_MARKER: &str = ".built";

/// Explicit registry and cache roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    registry_root: PathBuf,
    cache_root: PathBuf,
}

impl CacheLayout {
    pub fn new(registry_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        CacheLayout {
            registry_root: registry_root.into(),
            cache_root: cache_root.into(),
        }
    }

    pub fn registry_root(&self) -> &Path {
        &self.registry_root
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Registry directory of a package; also the source dir handed to CMake.
    pub fn registry_dir(&self, name: &str) -> PathBuf {
        self.registry_root.join(name)
    }

    /// `<registry>/<name>/<name>.config`
    pub fn descriptor_path(&self, name: &str) -> PathBuf {
        self.registry_dir(name)
            .join(format!("{}.{}", name, DESCRIPTOR_EXTENSION))
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.cache_root.join(name)
    }

    pub fn built_marker(&self, name: &str) -> PathBuf {
        self.package_dir(name).join(BUILT_MARKER)
    }

    /// Is the package known to the registry?
    pub fn exists(&self, name: &str) -> bool {
        let dir = self.registry_dir(name);
        let found = dir.is_dir();
        tracing::debug!("registry entry {}: {}", dir.display(), found);
        found
    }

    /// Has the package been cloned into the cache?
    pub fn cloned(&self, name: &str) -> bool {
        let dir = self.package_dir(name);
        let found = dir.is_dir();
        tracing::debug!("cache entry {}: {}", dir.display(), found);
        found
    }

    /// Has every build variant of the package completed?
    pub fn built(&self, name: &str) -> bool {
        let marker = self.built_marker(name);
        let found = marker.is_file();
        tracing::debug!("marker {}: {}", marker.display(), found);
        found
    }

    /// Current lifecycle state derived from the cache.
    ///
    /// `report` sees every check as it is made: the step tested
    /// (`Cloned`, then `Built` only for a cloned package) and its answer.
    pub fn probe(&self, name: &str, mut report: impl FnMut(PackageState, bool)) -> PackageState {
        let cloned = self.cloned(name);
        report(PackageState::Cloned, cloned);
        if !cloned {
            return PackageState::None;
        }

        let built = self.built(name);
        report(PackageState::Built, built);
        if built {
            PackageState::Built
        } else {
            PackageState::Cloned
        }
    }
}
