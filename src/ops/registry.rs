//! Keeping the package registry in sync with its upstream repository.

use anyhow::Result;

use crate::core::ConfigError;
use crate::sources::Git;
use crate::util::context::GlobalContext;
use crate::util::process::CommandRunner;
use crate::util::shell::{Shell, Status};

/// Clone the registry if it is missing, otherwise pull it.
///
/// Network failures only warn: a stale registry is still usable. A registry
/// that is missing after the attempt is a hard error.
pub fn sync_registry(ctx: &GlobalContext, runner: &dyn CommandRunner, shell: &Shell) -> Result<()> {
    let root = ctx.registry_root();

    if ctx.should_sync_registry() {
        let git = Git::new(runner);
        if root.is_dir() {
            let result = git.pull(root);
            shell.outcome(Status::Syncing, "updating package definitions", result.is_ok());
            if let Err(e) = result {
                shell.warn(format!("using the existing registry: {:#}", e));
            }
        } else {
            let result = git.clone_full(ctx.config().registry_url(), root);
            shell.outcome(Status::Syncing, "cloning package definitions", result.is_ok());
            if let Err(e) = result {
                tracing::warn!("registry clone failed: {:#}", e);
            }
        }
    } else {
        tracing::debug!("registry sync disabled");
    }

    if !root.is_dir() {
        return Err(ConfigError::DirectoryNotFound {
            path: root.to_path_buf(),
        }
        .into());
    }
    Ok(())
}
