//! Building packages across the toolchain matrix.
//!
//! This module defines the build matrix and drives CMake for each variant.

pub mod cmake;
pub mod matrix;

pub use cmake::CMakeBuilder;
pub use matrix::{BuildMatrix, LinkType, Toolchain, Variant};
