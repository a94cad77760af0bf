//! High-level operations.
//!
//! This module contains the implementation of the narcpm modes and the
//! orchestration steps they are built from.

pub mod narcpm_init;
pub mod narcpm_run;
pub mod orchestrate;
pub mod registry;
pub mod render;

pub use narcpm_init::init;
pub use narcpm_run::run;
pub use orchestrate::{Orchestrator, Resolved, RunReport};
pub use registry::sync_registry;
pub use render::{render_dependencies, DependencyFile, DEPENDENCIES_FILE};
