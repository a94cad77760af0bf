//! `narcpm --init`

use anyhow::{Context, Result};

use super::context;
use crate::cli::Cli;
use narcpm::ops::narcpm_init::init;
use narcpm::util::shell::{Shell, Status};

pub fn execute(cli: &Cli, shell: &Shell) -> Result<()> {
    let ctx = context(cli)?;
    let program = std::env::current_exe().context("failed to locate the narcpm executable")?;

    let path = init(&ctx, &cli.project_root, &program)?;
    shell.status(Status::Writing, format!("{}... done", path.display()));
    Ok(())
}
