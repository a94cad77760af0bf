//! User-friendly diagnostic messages.
//!
//! Every failure shown to the user carries its root cause, the context it
//! happened in, and what to try next.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when narcpm is not started from its installation root.
    pub const NOT_INSTALL_ROOT: &str =
        "Run narcpm from the directory containing its `narcpm/` directory, or pass `--root`";

    /// Suggestion when the registry is missing.
    pub const NO_REGISTRY: &str =
        "Run without `--offline` to clone the registry, or pass `--registry-root`";

    /// Suggestion when a package fails to build.
    pub const BUILD_FAILED: &str = "Run `narcpm --verbose` to see the CMake output";

    /// Suggestion when a clone or pull fails.
    pub const FETCH_FAILED: &str = "Check your network connection and the repository URL";

    /// Suggestion when the cache lock is held.
    pub const CACHE_LOCKED: &str =
        "Wait for the other run to finish, or point `--cache-root` at a different cache";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// An error that already carries its full diagnostic.
///
/// `main` prints the diagnostic instead of the one-line message.
#[derive(Debug, Error)]
#[error("{}", .0.message)]
pub struct DiagnosticError(pub Diagnostic);

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("2 packages failed to build")
            .with_context("glfw: `cmake --build cache/glfw/build/gcc/Debug/static` failed")
            .with_context("zlib: `git clone -q` failed with exit code 128")
            .with_suggestion(suggestions::BUILD_FAILED)
            .with_location("project/narcpm.config");

        let output = diag.format(false);
        assert!(output.starts_with("error: 2 packages failed to build\n"));
        assert!(output.contains("  --> project/narcpm.config"));
        assert!(output.contains("  = glfw: `cmake --build"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Run `narcpm --verbose`"));
    }

    #[test]
    fn test_diagnostic_error_message() {
        let err = DiagnosticError(Diagnostic::error("1 package(s) failed").with_context("foo"));
        assert_eq!(err.to_string(), "1 package(s) failed");
    }

    #[test]
    fn test_warning_without_suggestions() {
        let output = Diagnostic::warning("registry pull failed").format(false);
        assert_eq!(output, "warning: registry pull failed\n");
    }

    #[test]
    fn test_colored_severity() {
        let output = Diagnostic::error("boom").format(true);
        assert!(output.contains("\x1b[1;31merror\x1b[0m"));
    }
}
