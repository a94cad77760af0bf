//! narcpm - a package manager for CMake-based native dependencies
//!
//! This crate provides the core library functionality for narcpm: the
//! package model and its config formats, the repository and build caches,
//! the build-matrix orchestration, and the `dependencies.cmake` renderer.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for narcpm unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted command runner and a throwaway
/// registry/cache layout.
#[cfg(test)]
pub mod test_support;

pub use core::{Import, Manifest, Package, PackageState};
pub use util::context::GlobalContext;
