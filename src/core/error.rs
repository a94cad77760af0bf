//! Configuration error kinds.
//!
//! Everything here is unrecoverable: a run that hits one of these aborts
//! before touching the repository or build caches.

use std::ffi::OsStr;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::manifest::MANIFEST_NAME;
use crate::core::section::ParseError;
use crate::util::diagnostic::Diagnostic as Report;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("no config found at {}", path.display())]
    #[diagnostic(code(narcpm::config::not_found))]
    NotFound { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("no [{section}] section found in {}", path.display())]
    #[diagnostic(code(narcpm::config::missing_section))]
    MissingSection { path: PathBuf, section: String },

    #[error("invalid value `{value}` for `{key}` in [{section}] of {}; expected `true` or `false`", path.display())]
    #[diagnostic(code(narcpm::config::invalid_value))]
    InvalidValue {
        path: PathBuf,
        section: String,
        key: String,
        value: String,
    },

    #[error("package `{package}` has no sub-package `{subpackage}`")]
    #[diagnostic(code(narcpm::config::unresolved_subpackage))]
    UnresolvedSubpackage {
        package: String,
        subpackage: String,
        available: Vec<String>,
    },

    #[error("{}: no such directory", path.display())]
    #[diagnostic(code(narcpm::config::directory_not_found))]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(narcpm::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Convert to a user-facing report with suggested fixes.
    pub fn to_report(&self) -> Report {
        match self {
            ConfigError::NotFound { path } => {
                let suggestion = if path.file_name() == Some(OsStr::new(MANIFEST_NAME)) {
                    "Create narcpm.config in the project root with one `[<package>]` section per import"
                } else {
                    "Check that the package name is spelled correctly"
                };
                Report::error(self.to_string())
                    .with_location(path)
                    .with_suggestion(suggestion)
            }

            ConfigError::Parse(err) => Report::error(format!("malformed config: {}", err))
                .with_suggestion("Every line must be a `[section]` header or a `key = value` pair"),

            ConfigError::MissingSection { path, section } => Report::error(self.to_string())
                .with_location(path)
                .with_suggestion(format!("Add a `[{}]` section to the descriptor", section)),

            ConfigError::InvalidValue { path, key, .. } => Report::error(self.to_string())
                .with_location(path)
                .with_suggestion(format!("Use `{} = true` or `{} = false`", key, key)),

            ConfigError::UnresolvedSubpackage {
                package,
                available,
                ..
            } => {
                let mut report = Report::error(self.to_string());
                if available.is_empty() {
                    report = report.with_context(format!("`{}` declares no sub-packages", package));
                } else {
                    report = report.with_context(format!(
                        "available sub-packages: {}",
                        available.join(", ")
                    ));
                }
                report.with_suggestion("Remove the sub-package from narcpm.config")
            }

            ConfigError::DirectoryNotFound { path } => {
                Report::error(self.to_string()).with_location(path)
            }

            ConfigError::Io { path, source } => Report::error(self.to_string())
                .with_location(path)
                .with_context(source.to_string()),
        }
    }
}
