//! The package state machine: `none -> cloned -> built`.
//!
//! A run resolves the manifest against the registry, brings every package's
//! repository into the cache, then builds whatever is not built yet across
//! the build matrix. Each step is sequential and only moves packages
//! forward.
//!
//! Failures are per package. A failed clone or build is recorded on the
//! package and the run continues with the others; the caller decides what
//! a failure means for the exit status.

use std::fmt;

use anyhow::{bail, Context, Result};

use crate::builder::cmake::{is_cmake_project, CMakeBuilder};
use crate::builder::matrix::{BuildMatrix, LinkType};
use crate::core::{load_descriptor, ConfigError, Import, Manifest, Package, PackageState};
use crate::sources::{CacheLayout, Git};
use crate::util::config::{DEFAULT_GENERATOR, DEFAULT_JOBS};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{remove_dir_all_if_exists, remove_file_if_exists, write_string};
use crate::util::process::CommandRunner;
use crate::util::shell::{Shell, Status};

/// An import paired with the package it resolved to.
///
/// The link type lives on the import, so every later pass reads it from
/// here rather than from a lookup keyed by name.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub import: Import,
    pub package: Package,
    failure: Option<String>,
}

impl Resolved {
    pub fn new(import: Import, package: Package) -> Self {
        Resolved {
            import,
            package,
            failure: None,
        }
    }

    pub fn name(&self) -> &str {
        self.package.name()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    fn fail(&mut self, reason: impl Into<String>) {
        self.failure = Some(reason.into());
    }

    /// The leaf targets this import renders, with their link types.
    ///
    /// A package without sub-packages is its own single leaf. Otherwise the
    /// import's sub-package list picks the leaves; an empty list means all
    /// of them, linked the way the import says.
    pub fn leaves(&self) -> Vec<(&Package, LinkType)> {
        if !self.package.has_subpackages() {
            return vec![(&self.package, LinkType::from_static(self.import.link_static))];
        }

        if self.import.subpackages.is_empty() {
            let link = LinkType::from_static(self.import.link_static);
            return self.package.subpackages().iter().map(|p| (p, link)).collect();
        }

        self.import
            .subpackages
            .iter()
            .filter_map(|sub| {
                self.package
                    .subpackage(&sub.package_name(&self.import.name))
                    .map(|p| (p, LinkType::from_static(sub.link_static)))
            })
            .collect()
    }
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub packages: Vec<Resolved>,
}

impl RunReport {
    /// Packages that finished the run usable.
    pub fn succeeded(&self) -> impl Iterator<Item = &Resolved> {
        self.packages.iter().filter(|r| !r.is_failed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &Resolved> {
        self.packages.iter().filter(|r| r.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.packages.iter().any(Resolved::is_failed)
    }

    /// A summary of every failed package, if any failed.
    pub fn failure_report(&self) -> Option<Diagnostic> {
        let failed: Vec<_> = self.failed().collect();
        if failed.is_empty() {
            return None;
        }

        let mut report = Diagnostic::error(format!("{} package(s) failed", failed.len()));
        for resolved in &failed {
            report = report.with_context(resolved.to_string());
        }
        Some(
            report
                .with_suggestion(suggestions::BUILD_FAILED)
                .with_suggestion(suggestions::FETCH_FAILED),
        )
    }
}

/// Drives packages through the cache.
pub struct Orchestrator<'a> {
    layout: &'a CacheLayout,
    matrix: &'a BuildMatrix,
    runner: &'a dyn CommandRunner,
    shell: &'a Shell,
    generator: String,
    jobs: usize,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        layout: &'a CacheLayout,
        matrix: &'a BuildMatrix,
        runner: &'a dyn CommandRunner,
        shell: &'a Shell,
    ) -> Self {
        Orchestrator {
            layout,
            matrix,
            runner,
            shell,
            generator: DEFAULT_GENERATOR.to_string(),
            jobs: DEFAULT_JOBS,
        }
    }

    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Resolve, clone and build everything the manifest imports.
    pub fn run(&self, manifest: Manifest) -> Result<RunReport> {
        let mut packages = self.resolve(manifest)?;
        self.update_repository_cache(&mut packages);
        self.update_build_cache(&mut packages)?;
        Ok(RunReport { packages })
    }

    /// Pair every registered import with its descriptor and probe its state.
    ///
    /// Imports the registry doesn't know are dropped. Descriptor errors and
    /// sub-package imports the descriptor doesn't declare abort the run.
    pub fn resolve(&self, manifest: Manifest) -> Result<Vec<Resolved>, ConfigError> {
        let imports = manifest.into_registered(|name| {
            let found = self.layout.exists(name);
            self.shell.probe(
                format!("package {}", name),
                if found { "found" } else { "not found" },
            );
            found
        });

        let mut resolved = Vec::with_capacity(imports.len());
        for import in imports {
            let mut package = load_descriptor(self.layout, &import.name)?;
            check_subpackages(&import, &package)?;

            let state = self.layout.probe(package.name(), |step, found| {
                self.shell
                    .probe(format!("{} has been {}", import.name, step), yes_no(found));
            });
            package.advance(state);

            resolved.push(Resolved::new(import, package));
        }
        Ok(resolved)
    }

    /// Clone missing repositories and update the ones imported with
    /// `update = true`.
    pub fn update_repository_cache(&self, packages: &mut [Resolved]) {
        let git = Git::new(self.runner);

        for resolved in packages.iter_mut() {
            let Some(url) = resolved.package.repository().map(str::to_string) else {
                // Local-only: nothing to fetch. Headers-only packages are
                // complete as they are.
                if !resolved.package.needs_build() {
                    resolved.package.advance(PackageState::Built);
                }
                continue;
            };

            match resolved.package.state() {
                PackageState::None => self.clone_package(&git, resolved, &url),
                _ if resolved.import.update => self.update_package(&git, resolved),
                _ => {}
            }
        }
    }

    fn clone_package(&self, git: &Git<'_>, resolved: &mut Resolved, url: &str) {
        let package = &mut resolved.package;
        let dest = package.repository_dir();

        match git.clone_repository(url, &dest, package.commit()) {
            Ok(()) => {
                self.shell.outcome(Status::Cloning, package.name(), true);
                package.advance(PackageState::Cloned);
                if !package.needs_build() {
                    package.advance(PackageState::Built);
                }
            }
            Err(e) => {
                self.shell.outcome(Status::Cloning, package.name(), false);
                tracing::warn!("clone of {} failed: {:#}", package.name(), e);

                // Leave no half-cloned tree for the next probe to mistake
                // for a finished clone.
                if let Err(e) = remove_dir_all_if_exists(package.location()) {
                    tracing::warn!("{:#}", e);
                }
                resolved.fail(format!("clone failed: {:#}", e));
            }
        }
    }

    fn update_package(&self, git: &Git<'_>, resolved: &mut Resolved) {
        let package = &resolved.package;

        match git.update(&package.repository_dir(), package.commit()) {
            Ok(()) => self.shell.outcome(Status::Updating, package.name(), true),
            Err(e) => {
                self.shell.outcome(Status::Updating, package.name(), false);
                self.shell.warn(format!(
                    "update of {} failed; its build output was discarded: {:#}",
                    package.name(),
                    e
                ));

                // The state stays where it is. The next probe finds no
                // marker and rebuilds.
                for result in [
                    remove_dir_all_if_exists(&package.build_dir()),
                    remove_file_if_exists(&package.built_marker()),
                ] {
                    if let Err(e) = result {
                        tracing::warn!("{:#}", e);
                    }
                }
            }
        }
    }

    /// Build every cloned (or local-only) package that isn't built yet.
    ///
    /// A failing variant stops that package: its remaining variants are
    /// skipped, no marker is written and the failure is recorded.
    pub fn update_build_cache(&self, packages: &mut [Resolved]) -> Result<()> {
        for resolved in packages.iter_mut() {
            if resolved.is_failed() || resolved.package.state() == PackageState::Built {
                continue;
            }
            let package = &resolved.package;
            if package.state() == PackageState::None && package.repository().is_some() {
                continue;
            }

            if !package.needs_build() {
                resolved.package.advance(PackageState::Built);
                continue;
            }

            if let Err(e) = self.build_package(&resolved.package) {
                self.shell.outcome(Status::Building, resolved.name(), false);
                tracing::warn!("build of {} failed: {:#}", resolved.name(), e);
                resolved.fail(format!("{:#}", e));
                continue;
            }

            write_string(&resolved.package.built_marker(), "").with_context(|| {
                format!("failed to mark {} as built", resolved.name())
            })?;
            self.shell.outcome(Status::Building, resolved.name(), true);
            resolved.package.advance(PackageState::Built);
        }
        Ok(())
    }

    fn build_package(&self, package: &Package) -> Result<()> {
        let recipe = self.layout.registry_dir(package.name());
        if !is_cmake_project(&recipe) {
            bail!("{} has no CMakeLists.txt", recipe.display());
        }

        let builder = CMakeBuilder::new(self.runner, recipe, package.location())
        .generator(&self.generator)
        .jobs(self.jobs);

        let mut progress = self
            .shell
            .progress(self.matrix.len() as u64, format!("building {}", package));

        for variant in self.matrix.variants() {
            progress.inc(1, variant);
            builder
                .build(&variant)
                .with_context(|| format!("{} ({})", package, variant))?;
        }
        Ok(())
    }
}

/// Every sub-package the import names must be declared by the descriptor.
fn check_subpackages(import: &Import, package: &Package) -> Result<(), ConfigError> {
    for sub in &import.subpackages {
        let name = sub.package_name(&import.name);
        if package.subpackage(&name).is_none() {
            return Err(ConfigError::UnresolvedSubpackage {
                package: import.name.clone(),
                subpackage: sub.name.clone(),
                available: package
                    .subpackages()
                    .iter()
                    .map(|p| p.name().trim_start_matches(&format!("{}_", import.name)).to_string())
                    .collect(),
            });
        }
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            Some(reason) => write!(f, "{} ({})", self.package, reason),
            None => write!(f, "{} ({})", self.package, self.package.state()),
        }
    }
}
