//! Test utilities and mocks for narcpm unit tests.
//!
//! [`MockRunner`] stands in for git and CMake: it records every command it
//! is asked to run and answers with scripted exit codes. [`RegistryFixture`]
//! lays out a throwaway installation root with a registry, a cache and a
//! project directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use narcpm::test_support::{MockRunner, RegistryFixture};
//!
//! #[test]
//! fn test_example() {
//!     let fixture = RegistryFixture::new()
//!         .package("fmt", "[package]\nrepository=git://x/fmt\n")
//!         .manifest("[fmt]\n");
//!
//!     let runner = MockRunner::new();
//!     runner.fail_matching("cmake --build", 2);
//!
//!     // Run the orchestrator against fixture.layout() and runner...
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};
use tempfile::TempDir;

use crate::core::MANIFEST_NAME;
use crate::sources::layout::{CacheLayout, BUILT_MARKER, DESCRIPTOR_EXTENSION};
use crate::util::process::{CommandRunner, ProcessBuilder, RunStatus};

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s.as_str()),
            CommandPattern::Any => true,
        }
    }
}

/// What a scripted command does when it matches.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Exit(i32),
    SpawnError,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<ProcessBuilder>,
    rules: Vec<(CommandPattern, Outcome)>,
    simulate_clones: bool,
}

/// Scripted [`CommandRunner`].
///
/// Every command succeeds unless a rule registered with
/// [`fail_matching`](MockRunner::fail_matching) or
/// [`fail_to_spawn`](MockRunner::fail_to_spawn) matches it. The first
/// matching rule wins.
#[derive(Debug, Default)]
pub struct MockRunner {
    state: Mutex<State>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Make a successful `git clone` create its destination directory, so
    /// later probes see the package as cloned.
    pub fn simulate_clones(self) -> Self {
        self.state().simulate_clones = true;
        self
    }

    /// Exit with `code` for every command containing `pattern`.
    pub fn fail_matching(&self, pattern: &str, code: i32) {
        self.state().rules.push((
            CommandPattern::Contains(pattern.to_string()),
            Outcome::Exit(code),
        ));
    }

    /// Report commands containing `pattern` as impossible to start.
    pub fn fail_to_spawn(&self, pattern: &str) {
        self.state()
            .rules
            .push((CommandPattern::Contains(pattern.to_string()), Outcome::SpawnError));
    }

    /// Every command run so far, as display strings.
    pub fn calls(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }

    /// Working directory of every command run so far.
    pub fn cwds(&self) -> Vec<Option<PathBuf>> {
        self.state()
            .calls
            .iter()
            .map(|c| c.get_cwd().map(Path::to_path_buf))
            .collect()
    }

    /// Commands matching `pattern`.
    pub fn calls_matching(&self, pattern: &str) -> Vec<String> {
        let pattern = CommandPattern::Contains(pattern.to_string());
        self.calls()
            .into_iter()
            .filter(|c| pattern.matches(c))
            .collect()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<RunStatus> {
        let mut state = self.state();
        state.calls.push(cmd.clone());

        let line = cmd.display_command();
        let outcome = state
            .rules
            .iter()
            .find(|(pattern, _)| pattern.matches(&line))
            .map(|(_, outcome)| *outcome);

        match outcome {
            Some(Outcome::SpawnError) => bail!("failed to spawn `{}`", cmd.get_program().display()),
            Some(Outcome::Exit(code)) => Ok(RunStatus::from_code(code)),
            None => {
                let args = cmd.get_args();
                if state.simulate_clones && args.first().map(String::as_str) == Some("clone") {
                    if let Some(dest) = args.last() {
                        fs::create_dir_all(dest)?;
                    }
                }
                Ok(RunStatus::SUCCESS)
            }
        }
    }
}

/// A temporary installation root: `narcpm/`, `packages/`, `cache/` and a
/// `project/` directory for the consuming project.
pub struct RegistryFixture {
    tmp: TempDir,
}

impl RegistryFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        for dir in ["narcpm", "packages", "cache", "project"] {
            fs::create_dir_all(tmp.path().join(dir)).expect("failed to create fixture dir");
        }
        RegistryFixture { tmp }
    }

    /// Register a package with the given descriptor text and an empty
    /// build recipe.
    pub fn package(self, name: &str, descriptor: &str) -> Self {
        let dir = self.registry_root().join(name);
        fs::create_dir_all(&dir).expect("failed to create package dir");
        fs::write(
            dir.join(format!("{}.{}", name, DESCRIPTOR_EXTENSION)),
            descriptor,
        )
        .expect("failed to write descriptor");
        fs::write(dir.join("CMakeLists.txt"), "").expect("failed to write CMakeLists.txt");
        self
    }

    /// Write the project's manifest.
    pub fn manifest(self, text: &str) -> Self {
        fs::write(self.project_dir().join(MANIFEST_NAME), text)
            .expect("failed to write manifest");
        self
    }

    /// Pretend `name` has already been cloned.
    pub fn cloned(self, name: &str) -> Self {
        fs::create_dir_all(self.cache_root().join(name).join("repository"))
            .expect("failed to create repository dir");
        self
    }

    /// Pretend `name` has already been cloned and built.
    pub fn built(self, name: &str) -> Self {
        let this = self.cloned(name);
        fs::write(this.cache_root().join(name).join(BUILT_MARKER), "")
            .expect("failed to write built marker");
        this
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn registry_root(&self) -> PathBuf {
        self.root().join("packages")
    }

    pub fn cache_root(&self) -> PathBuf {
        self.root().join("cache")
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn layout(&self) -> CacheLayout {
        CacheLayout::new(self.registry_root(), self.cache_root())
    }
}

impl Default for RegistryFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_records_calls() {
        let runner = MockRunner::new();
        runner
            .run(&ProcessBuilder::new("git").args(["pull", "-q"]).cwd("repo"))
            .unwrap();
        runner.run(&ProcessBuilder::new("cmake").arg("--version")).unwrap();

        assert_eq!(runner.calls(), ["git pull -q", "cmake --version"]);
        assert_eq!(runner.cwds(), [Some(PathBuf::from("repo")), None]);
        assert_eq!(runner.calls_matching("cmake"), ["cmake --version"]);
    }

    #[test]
    fn test_mock_runner_rules() {
        let runner = MockRunner::new();
        runner.fail_matching("--build", 2);
        runner.fail_to_spawn("git");

        let status = runner
            .run(&ProcessBuilder::new("cmake").args(["--build", "."]))
            .unwrap();
        assert_eq!(status.code(), Some(2));

        assert!(runner.run(&ProcessBuilder::new("git").arg("pull")).is_err());
        assert!(runner.run(&ProcessBuilder::new("cmake").arg(".")).unwrap().success());
    }

    #[test]
    fn test_simulated_clone_creates_dest() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("repo");

        let runner = MockRunner::new().simulate_clones();
        runner
            .run(&ProcessBuilder::new("git").args(["clone", "-q", "url"]).arg(&dest))
            .unwrap();
        assert!(dest.is_dir());
    }

    #[test]
    fn test_registry_fixture() {
        let fixture = RegistryFixture::new()
            .package("zlib", "[package]\n")
            .manifest("[zlib]\n")
            .built("zlib");

        let layout = fixture.layout();
        assert!(layout.exists("zlib"));
        assert!(layout.cloned("zlib"));
        assert!(layout.built("zlib"));
        assert!(fixture.project_dir().join(MANIFEST_NAME).is_file());
        assert!(fixture.root().join("narcpm").is_dir());
    }
}
