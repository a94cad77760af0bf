//! `narcpm --run`

use anyhow::Result;

use super::context;
use crate::cli::Cli;
use narcpm::core::ConfigError;
use narcpm::ops::narcpm_run::run;
use narcpm::sources::LockError;
use narcpm::util::diagnostic::{suggestions, Diagnostic, DiagnosticError};
use narcpm::util::process::{find_cmake, find_git, ProcessRunner};
use narcpm::util::shell::Shell;
use narcpm::util::GlobalContext;

pub fn execute(cli: &Cli, shell: &Shell) -> Result<()> {
    let ctx = context(cli)?;

    if find_git().is_none() {
        shell.warn("git not found in PATH; cloning will fail");
    }
    if find_cmake().is_none() {
        shell.warn("cmake not found in PATH; building will fail");
    }

    let runner = ProcessRunner::new().inherit_output(shell.is_verbose());
    let report = run(&ctx, &cli.project_root, &runner, shell).map_err(|e| explain(e, &ctx))?;

    match report.failure_report() {
        Some(failures) => Err(DiagnosticError(failures).into()),
        None => Ok(()),
    }
}

/// Attach the next step to errors the user can fix from the command line.
fn explain(err: anyhow::Error, ctx: &GlobalContext) -> anyhow::Error {
    if let Some(ConfigError::DirectoryNotFound { path }) = err.downcast_ref::<ConfigError>() {
        if path == ctx.registry_root() {
            let report = ConfigError::DirectoryNotFound { path: path.clone() }
                .to_report()
                .with_suggestion(suggestions::NO_REGISTRY);
            return DiagnosticError(report).into();
        }
    }

    if let Some(locked @ LockError::Locked { .. }) = err.downcast_ref::<LockError>() {
        let report =
            Diagnostic::error(locked.to_string()).with_suggestion(suggestions::CACHE_LOCKED);
        return DiagnosticError(report).into();
    }

    err
}
