//! CMake driver for registry packages.
//!
//! The registry ships a `CMakeLists.txt` next to every package descriptor.
//! It is configured against the cloned sources (`PACKAGE_ROOT`) once per
//! matrix variant, built, and installed back into the package's cache
//! directory.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::matrix::Variant;
use crate::util::fs::ensure_dir;
use crate::util::process::{run_checked, CommandRunner, ProcessBuilder};

/// CMake build adapter for one package.
pub struct CMakeBuilder<'a> {
    runner: &'a dyn CommandRunner,
    program: PathBuf,
    generator: String,
    jobs: usize,
    source_dir: PathBuf,
    package_root: PathBuf,
}

impl<'a> CMakeBuilder<'a> {
    /// `source_dir` is the registry directory holding the CMakeLists;
    /// `package_root` is the package's cache directory.
    pub fn new(
        runner: &'a dyn CommandRunner,
        source_dir: impl Into<PathBuf>,
        package_root: impl Into<PathBuf>,
    ) -> Self {
        CMakeBuilder {
            runner,
            program: PathBuf::from("cmake"),
            generator: "Unix Makefiles".to_string(),
            jobs: 1,
            source_dir: source_dir.into(),
            package_root: package_root.into(),
        }
    }

    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Build directory of `variant`.
    pub fn build_dir(&self, variant: &Variant<'_>) -> PathBuf {
        variant.build_dir(&self.package_root)
    }

    /// Configure, build and install one variant.
    pub fn build(&self, variant: &Variant<'_>) -> Result<()> {
        let build_dir = self.build_dir(variant);
        ensure_dir(&build_dir)?;

        tracing::debug!("building {} in {}", variant, build_dir.display());
        self.configure(variant, &build_dir)?;
        self.compile(&build_dir)?;
        self.install(&build_dir)
    }

    fn configure(&self, variant: &Variant<'_>, build_dir: &Path) -> Result<()> {
        let cmd = ProcessBuilder::new(&self.program)
            .arg("-G")
            .arg(&self.generator)
            .arg(format!("-DCMAKE_BUILD_TYPE={}", variant.build_type))
            .arg(format!("-DCMAKE_C_COMPILER={}", variant.toolchain.cc))
            .arg(format!("-DCMAKE_CXX_COMPILER={}", variant.toolchain.cxx))
            .arg(format!("-DTOOLCHAIN={}", variant.toolchain.name))
            .arg(format!(
                "-DBUILD_SHARED_LIBS={}",
                variant.link_type.shared_libs_flag()
            ))
            .arg(format!("-DPACKAGE_ROOT={}", self.package_root.display()))
            .arg(&self.source_dir)
            .cwd(build_dir);

        run_checked(self.runner, &cmd)
    }

    fn compile(&self, build_dir: &Path) -> Result<()> {
        let cmd = ProcessBuilder::new(&self.program)
            .arg("--build")
            .arg(build_dir)
            .arg("--parallel")
            .arg(self.jobs.to_string());

        run_checked(self.runner, &cmd)
    }

    fn install(&self, build_dir: &Path) -> Result<()> {
        let cmd = ProcessBuilder::new(&self.program)
            .arg("--build")
            .arg(build_dir)
            .args(["--target", "install"]);

        run_checked(self.runner, &cmd)
    }
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}
