//! Configuration file support for narcpm.
//!
//! narcpm reads two configuration files:
//! - Global: `<config_dir>/narcpm/config.toml` - User-wide defaults
//! - Installation: `<root>/narcpm.toml` - Overrides for one installation
//!
//! The installation file takes precedence over the global one. Anything
//! left unset in both falls back to the built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::matrix::{BuildMatrix, LinkType, Toolchain};

/// Registry repository cloned into the registry root.
pub const DEFAULT_REGISTRY_URL: &str = "https://github.com/Berling/narcpm_packages.git";

pub const DEFAULT_GENERATOR: &str = "Unix Makefiles";

pub const DEFAULT_JOBS: usize = 8;

/// Name of the per-installation config file.
pub const CONFIG_FILE: &str = "narcpm.toml";

/// narcpm configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry settings
    pub registry: RegistryConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Toolchains of the build matrix (empty = built-in clang and gcc)
    pub toolchains: Vec<Toolchain>,
}

/// Registry-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Git URL of the package registry
    pub url: Option<String>,

    /// Clone or pull the registry before a run
    pub sync: Option<bool>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// CMake generator
    pub generator: Option<String>,

    /// Parallel jobs passed to `cmake --build`
    pub jobs: Option<usize>,

    /// Build types of the matrix
    pub build_types: Vec<String>,

    /// Link types of the matrix
    pub link_types: Vec<LinkType>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or can't be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.registry.url.is_some() {
            self.registry.url = other.registry.url;
        }
        if other.registry.sync.is_some() {
            self.registry.sync = other.registry.sync;
        }

        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        // Lists are replaced, not appended
        if !other.build.build_types.is_empty() {
            self.build.build_types = other.build.build_types;
        }
        if !other.build.link_types.is_empty() {
            self.build.link_types = other.build.link_types;
        }
        if !other.toolchains.is_empty() {
            self.toolchains = other.toolchains;
        }
    }

    pub fn registry_url(&self) -> &str {
        self.registry.url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL)
    }

    pub fn sync_registry(&self) -> bool {
        self.registry.sync.unwrap_or(true)
    }

    pub fn generator(&self) -> &str {
        self.build.generator.as_deref().unwrap_or(DEFAULT_GENERATOR)
    }

    pub fn jobs(&self) -> usize {
        self.build.jobs.unwrap_or(DEFAULT_JOBS).max(1)
    }

    /// The build matrix, with defaults filled in per dimension.
    pub fn matrix(&self) -> BuildMatrix {
        let defaults = BuildMatrix::default();
        BuildMatrix {
            toolchains: if self.toolchains.is_empty() {
                defaults.toolchains
            } else {
                self.toolchains.clone()
            },
            build_types: if self.build.build_types.is_empty() {
                defaults.build_types
            } else {
                self.build.build_types.clone()
            },
            link_types: if self.build.link_types.is_empty() {
                defaults.link_types
            } else {
                self.build.link_types.clone()
            },
        }
    }
}

/// Load merged configuration from global and installation locations.
///
/// Order of precedence (highest to lowest):
/// 1. Installation config (`<root>/narcpm.toml`)
/// 2. Global config (`<config_dir>/narcpm/config.toml`)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, root_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if root_path.exists() {
        config.merge(Config::load_or_default(root_path));
    }

    config
}

/// Get the global config path (`<config_dir>/narcpm/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "narcpm").map(|d| d.config_dir().join("config.toml"))
}
