//! Command implementations

pub mod init;
pub mod run;

use anyhow::Result;

use crate::cli::Cli;
use narcpm::util::GlobalContext;

/// Build the context from the installation root and the command-line
/// overrides, and make sure it really is an installation root.
fn context(cli: &Cli) -> Result<GlobalContext> {
    let mut ctx = match &cli.root {
        Some(root) => GlobalContext::with_root(root),
        None => GlobalContext::new()?,
    };

    if let Some(path) = &cli.registry_root {
        ctx.set_registry_root(path);
    }
    if let Some(path) = &cli.cache_root {
        ctx.set_cache_root(path);
    }
    if let Some(jobs) = cli.jobs {
        ctx.set_jobs(jobs);
    }
    ctx.set_offline(cli.offline);

    ctx.check_install_root()?;
    Ok(ctx)
}
