//! Subprocess execution utilities.
//!
//! Everything that shells out (git, cmake) builds a [`ProcessBuilder`] and
//! hands it to a [`CommandRunner`]. Orchestration code only ever sees the
//! runner trait, so tests can substitute a scripted runner.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use anyhow::{bail, Context, Result};
use thiserror::Error;

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command with captured output and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;

        Ok(output)
    }

    /// Execute with inherited stdio and return status only.
    pub fn status(&self) -> Result<ExitStatus> {
        let mut cmd = self.build_command();
        let status = cmd
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))?;
        Ok(status)
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl fmt::Display for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_command())
    }
}

/// Exit status of a finished external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    code: Option<i32>,
}

impl RunStatus {
    pub const SUCCESS: RunStatus = RunStatus { code: Some(0) };

    pub fn from_code(code: i32) -> Self {
        RunStatus { code: Some(code) }
    }

    /// Terminated by a signal.
    pub fn signaled() -> Self {
        RunStatus { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<ExitStatus> for RunStatus {
    fn from(status: ExitStatus) -> Self {
        RunStatus {
            code: status.code(),
        }
    }
}

/// Runs external commands to completion.
///
/// `Err` means the command could not be started at all; a command that ran
/// and failed is an `Ok` carrying a non-success [`RunStatus`].
pub trait CommandRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<RunStatus>;
}

/// Runs commands as real child processes, blocking until they exit.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Stream child output to the terminal instead of capturing it.
    inherit_output: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner::default()
    }

    /// Stream child stdout/stderr instead of capturing them.
    pub fn inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<RunStatus> {
        tracing::debug!("running `{}`", cmd);
        if let Some(cwd) = cmd.get_cwd() {
            if !cwd.is_dir() {
                bail!("working directory {} does not exist", cwd.display());
            }
        }

        if self.inherit_output {
            return Ok(cmd.status()?.into());
        }

        let output = cmd.exec()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("`{}` failed:\n{}", cmd, stderr.trim_end());
        }
        Ok(output.status.into())
    }
}

/// An external tool ran and exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{command}` failed with {}", describe_code(*.code))]
pub struct ToolFailure {
    pub command: String,
    pub code: Option<i32>,
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

/// Run `cmd` and turn a non-zero exit into a [`ToolFailure`].
pub fn run_checked(runner: &dyn CommandRunner, cmd: &ProcessBuilder) -> Result<()> {
    let status = runner.run(cmd)?;
    if !status.success() {
        return Err(ToolFailure {
            command: cmd.display_command(),
            code: status.code(),
        }
        .into());
    }
    Ok(())
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find git.
pub fn find_git() -> Option<PathBuf> {
    find_executable("git")
}

/// Find CMake.
pub fn find_cmake() -> Option<PathBuf> {
    find_executable("cmake")
}
