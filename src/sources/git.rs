//! Git operations on package repositories and the registry.
//!
//! Git is driven through a [`CommandRunner`], one structured command per
//! operation, always with `-q`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::process::{run_checked, CommandRunner, ProcessBuilder};

/// Git driver over a command runner.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    program: PathBuf,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Git {
            runner,
            program: PathBuf::from("git"),
        }
    }

    fn git(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
    }

    /// Clone `url` into `dest`.
    ///
    /// Unpinned clones are shallow (depth 1). A pinned commit needs the full
    /// history, so it is a full clone followed by a checkout.
    pub fn clone_repository(&self, url: &str, dest: &Path, commit: Option<&str>) -> Result<()> {
        match commit {
            None => {
                tracing::info!("cloning {} (shallow)", url);
                run_checked(
                    self.runner,
                    &self
                        .git()
                        .args(["clone", "--depth", "1", "-q", url])
                        .arg(dest),
                )
            }
            Some(commit) => {
                tracing::info!("cloning {} at {}", url, commit);
                run_checked(self.runner, &self.git().args(["clone", "-q", url]).arg(dest))?;
                self.checkout(dest, commit)
            }
        }
    }

    /// Full clone without depth limit (used for the registry).
    pub fn clone_full(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("cloning {}", url);
        run_checked(self.runner, &self.git().args(["clone", "-q", url]).arg(dest))
    }

    /// Pull the current branch.
    pub fn pull(&self, repo: &Path) -> Result<()> {
        run_checked(self.runner, &self.git().args(["pull", "-q"]).cwd(repo))
    }

    pub fn fetch(&self, repo: &Path) -> Result<()> {
        run_checked(self.runner, &self.git().args(["fetch", "-q", "origin"]).cwd(repo))
    }

    pub fn checkout(&self, repo: &Path, commit: &str) -> Result<()> {
        run_checked(
            self.runner,
            &self.git().args(["checkout", "-q", commit]).cwd(repo),
        )
    }

    /// Bring an existing clone up to date.
    ///
    /// A pinned repository is fetched and re-checked-out at its commit
    /// (pulling a detached HEAD would fail); otherwise it is pulled.
    pub fn update(&self, repo: &Path, commit: Option<&str>) -> Result<()> {
        match commit {
            Some(commit) => {
                self.fetch(repo)?;
                self.checkout(repo, commit)
            }
            None => self.pull(repo),
        }
    }
}
