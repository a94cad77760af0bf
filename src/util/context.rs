//! Global context for narcpm operations.
//!
//! Holds the explicit roots every component works against. Nothing below
//! the binary reads the process working directory; it is consulted exactly
//! once, here, as the default installation root.
//!
//! ```text
//! <root>/
//! ├── narcpm/          # marks the installation root
//! ├── narcpm.toml      # optional installation config
//! ├── packages/        # registry clone (default registry root)
//! └── cache/           # build cache (default cache root)
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::sources::layout::CacheLayout;
use crate::util::config::{global_config_path, load_config, Config, CONFIG_FILE};
use crate::util::diagnostic::{suggestions, Diagnostic, DiagnosticError};
use crate::util::fs::normalize_path;

/// Directory whose presence marks the installation root.
pub const INSTALL_MARKER: &str = "narcpm";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Installation root
    root: PathBuf,

    /// Registry clone with one directory per package
    registry_root: PathBuf,

    /// Build cache
    cache_root: PathBuf,

    /// Merged configuration
    config: Config,

    /// Skip network operations on the registry
    offline: bool,
}

impl GlobalContext {
    /// Create a context rooted at the current working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_root(cwd))
    }

    /// Create a context rooted at `root`, loading its configuration.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = absolute(root.as_ref());
        let config = load_config(global_config_path().as_deref(), &root.join(CONFIG_FILE));
        Self::with_config(root, config)
    }

    /// Create a context with an explicit configuration.
    pub fn with_config(root: impl AsRef<Path>, config: Config) -> Self {
        let root = absolute(root.as_ref());
        GlobalContext {
            registry_root: root.join("packages"),
            cache_root: root.join("cache"),
            root,
            config,
            offline: false,
        }
    }

    pub fn set_registry_root(&mut self, path: impl AsRef<Path>) {
        self.registry_root = absolute(path.as_ref());
    }

    pub fn set_cache_root(&mut self, path: impl AsRef<Path>) {
        self.cache_root = absolute(path.as_ref());
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Override the configured job count.
    pub fn set_jobs(&mut self, jobs: usize) {
        self.config.build.jobs = Some(jobs);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_root(&self) -> &Path {
        &self.registry_root
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Should the registry be cloned or pulled before a run?
    pub fn should_sync_registry(&self) -> bool {
        self.config.sync_registry() && !self.offline
    }

    pub fn layout(&self) -> CacheLayout {
        CacheLayout::new(&self.registry_root, &self.cache_root)
    }

    /// Fail unless the root contains the `narcpm/` marker directory.
    pub fn check_install_root(&self) -> Result<()> {
        let marker = self.root.join(INSTALL_MARKER);
        if !marker.is_dir() {
            let report = Diagnostic::error(format!(
                "narcpm can only run from its root directory ({} has no `{}/` directory)",
                self.root.display(),
                INSTALL_MARKER
            ))
            .with_suggestion(suggestions::NOT_INSTALL_ROOT);
            return Err(DiagnosticError(report).into());
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize_path(&cwd.join(path)),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_roots() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_config(tmp.path(), Config::default());

        let root = normalize_path(tmp.path());
        assert_eq!(ctx.root(), root);
        assert_eq!(ctx.registry_root(), root.join("packages"));
        assert_eq!(ctx.cache_root(), root.join("cache"));
        assert_eq!(ctx.layout().cache_root(), root.join("cache"));
    }

    #[test]
    fn test_explicit_roots() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = GlobalContext::with_config(tmp.path(), Config::default());
        ctx.set_registry_root(tmp.path().join("reg"));
        ctx.set_cache_root(tmp.path().join("elsewhere"));

        assert!(ctx.registry_root().ends_with("reg"));
        assert!(ctx.cache_root().ends_with("elsewhere"));
    }

    #[test]
    fn test_check_install_root() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_config(tmp.path(), Config::default());

        let err = ctx.check_install_root().unwrap_err();
        assert!(err
            .to_string()
            .contains("narcpm can only run from its root directory"));

        std::fs::create_dir(tmp.path().join(INSTALL_MARKER)).unwrap();
        ctx.check_install_root().unwrap();
    }

    #[test]
    fn test_offline_disables_sync() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = GlobalContext::with_config(tmp.path(), Config::default());
        assert!(ctx.should_sync_registry());

        ctx.set_offline(true);
        assert!(!ctx.should_sync_registry());
    }

    #[test]
    fn test_root_config_is_loaded() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "[build]\njobs = 3\n").unwrap();

        let mut ctx = GlobalContext::with_root(tmp.path());
        assert_eq!(ctx.config().jobs(), 3);

        ctx.set_jobs(5);
        assert_eq!(ctx.config().jobs(), 5);
    }
}
