//! Core data structures for narcpm.
//!
//! This module contains the package model and the loaders that build it:
//! - The section-based text format shared by all config files
//! - Package descriptors from the registry
//! - The project manifest and its imports

pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod package;
pub mod section;

pub use descriptor::{load_descriptor, PACKAGE_SECTION};
pub use error::ConfigError;
pub use manifest::{Import, Manifest, SubImport, MANIFEST_NAME};
pub use package::{Package, PackageState};
pub use section::{Document, ParseError, ParseErrorKind, Section};
