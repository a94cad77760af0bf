//! narcpm CLI - dependency orchestration for CMake projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Mode};
use narcpm::core::ConfigError;
use narcpm::util::diagnostic::{emit, DiagnosticError};
use narcpm::util::shell::Shell;

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color);

    if let Err(e) = run(cli, &shell) {
        report(&e, &shell);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("narcpm=debug")
    } else if cli.quiet {
        EnvFilter::new("narcpm=error")
    } else {
        EnvFilter::new("narcpm=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.mode() {
        Mode::Init => commands::init::execute(&cli, shell),
        Mode::Run => commands::run::execute(&cli, shell),
    }
}

fn report(e: &anyhow::Error, shell: &Shell) {
    if let Some(DiagnosticError(diagnostic)) = e.downcast_ref::<DiagnosticError>() {
        emit(diagnostic, shell.use_color());
    } else if let Some(config) = e.downcast_ref::<ConfigError>() {
        emit(&config.to_report(), shell.use_color());
    } else {
        eprintln!("error: {:#}", e);
    }
}
