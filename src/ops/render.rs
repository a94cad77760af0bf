//! Rendering of `dependencies.cmake`.
//!
//! The generated file declares one imported target per leaf package. It
//! picks the toolchain and build type at the consumer's configure time, so
//! a single file serves every variant in the cache.

use std::fmt;
use std::path::Path;

use anyhow::Result;

use crate::builder::matrix::{BuildMatrix, LinkType};
use crate::core::Package;
use crate::ops::orchestrate::Resolved;
use crate::util::fs::write_atomic;

/// File name of the generated descriptor inside the project root.
pub const DEPENDENCIES_FILE: &str = "dependencies.cmake";

/// The generated descriptor, rendered through [`fmt::Display`].
pub struct DependencyFile<'a> {
    matrix: &'a BuildMatrix,
    packages: Vec<&'a Resolved>,
}

impl<'a> DependencyFile<'a> {
    /// Declarations follow the order of `packages`, which is manifest order.
    pub fn new(matrix: &'a BuildMatrix, packages: impl IntoIterator<Item = &'a Resolved>) -> Self {
        DependencyFile {
            matrix,
            packages: packages.into_iter().collect(),
        }
    }

    /// Number of targets the file declares.
    pub fn target_count(&self) -> usize {
        self.packages.iter().map(|r| r.leaves().len()).sum()
    }

    fn write_preamble(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cmake_minimum_required(VERSION 3.7 FATAL_ERROR)")?;
        writeln!(f)?;

        for (i, toolchain) in self.matrix.toolchains.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "elseif" };
            writeln!(
                f,
                "{}(CMAKE_C_COMPILER_ID MATCHES \"{id}\" OR CMAKE_CXX_COMPILER_ID MATCHES \"{id}\")",
                keyword,
                id = toolchain.compiler_id
            )?;
            writeln!(f, "\tset(TOOLCHAIN {})", toolchain.name)?;
        }
        if !self.matrix.toolchains.is_empty() {
            writeln!(f, "else()")?;
        }
        writeln!(
            f,
            "\tmessage(FATAL_ERROR \"unrecognized toolchain cc:${{CMAKE_C_COMPILER_ID}} cxx:${{CMAKE_CXX_COMPILER_ID}}\")"
        )?;
        if !self.matrix.toolchains.is_empty() {
            writeln!(f, "endif()")?;
        }
        writeln!(f)?;

        for (i, build_type) in self.matrix.build_types.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "elseif" };
            writeln!(f, "{}(CMAKE_BUILD_TYPE STREQUAL \"{}\")", keyword, build_type)?;
            writeln!(
                f,
                "\tset(RUNTIME_OUTPUT_DIRECTORY ${{CMAKE_RUNTIME_OUTPUT_DIRECTORY_{}}})",
                build_type.to_uppercase()
            )?;
        }
        if self.matrix.build_types.is_empty() {
            writeln!(f, "set(RUNTIME_OUTPUT_DIRECTORY ${{CMAKE_RUNTIME_OUTPUT_DIRECTORY}})")?;
        } else {
            writeln!(f, "else()")?;
            writeln!(f, "\tset(RUNTIME_OUTPUT_DIRECTORY ${{CMAKE_RUNTIME_OUTPUT_DIRECTORY}})")?;
            writeln!(f, "endif()")?;
        }
        Ok(())
    }
}

impl fmt::Display for DependencyFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_preamble(f)?;

        for resolved in &self.packages {
            for (package, link_type) in resolved.leaves() {
                writeln!(f)?;
                if package.is_interface() {
                    write_interface(f, package)?;
                } else {
                    write_library(f, package, link_type)?;
                }
            }
        }
        Ok(())
    }
}

fn write_interface(f: &mut fmt::Formatter<'_>, package: &Package) -> fmt::Result {
    writeln!(f, "add_library({} INTERFACE IMPORTED)", package.name())?;
    write_include_dirs(f, package, &package.interface_include_dir())
}

fn write_library(f: &mut fmt::Formatter<'_>, package: &Package, link_type: LinkType) -> fmt::Result {
    let file = link_type.library_file(package.name());
    let built = format!(
        "{}/${{TOOLCHAIN}}/${{CMAKE_BUILD_TYPE}}/{}",
        package.lib_dir().display(),
        file
    );

    writeln!(
        f,
        "add_library({} {} IMPORTED)",
        package.name(),
        link_type.cmake_keyword()
    )?;
    write_include_dirs(f, package, &package.include_dir())?;

    match link_type {
        LinkType::Static => {
            writeln!(f, "set_property(TARGET {} PROPERTY", package.name())?;
            writeln!(f, "\tIMPORTED_LOCATION \"{}\")", built)
        }
        LinkType::Shared => {
            let runtime = format!("${{RUNTIME_OUTPUT_DIRECTORY}}/{}", file);
            writeln!(f, "set_property(TARGET {} PROPERTY", package.name())?;
            writeln!(f, "\tIMPORTED_LOCATION \"{}\")", runtime)?;
            writeln!(
                f,
                "execute_process(COMMAND ${{CMAKE_COMMAND}} -E copy_if_different \"{}\" \"{}\")",
                built, runtime
            )
        }
    }
}

fn write_include_dirs(f: &mut fmt::Formatter<'_>, package: &Package, dir: &Path) -> fmt::Result {
    writeln!(f, "set_property(TARGET {} PROPERTY", package.name())?;
    writeln!(f, "\tINTERFACE_INCLUDE_DIRECTORIES \"{}\")", dir.display())
}

/// Render `packages` and replace `<project_root>/dependencies.cmake`.
///
/// Returns the number of declared targets.
pub fn render_dependencies<'a>(
    project_root: &Path,
    matrix: &'a BuildMatrix,
    packages: impl IntoIterator<Item = &'a Resolved>,
) -> Result<usize> {
    let file = DependencyFile::new(matrix, packages);
    let path = project_root.join(DEPENDENCIES_FILE);

    tracing::debug!("writing {}", path.display());
    write_atomic(&path, &file.to_string())?;
    Ok(file.target_count())
}
