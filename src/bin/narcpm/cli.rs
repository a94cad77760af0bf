//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use narcpm::util::shell::ColorChoice;

/// narcpm - fetch, build and declare CMake dependencies
#[derive(Parser)]
#[command(name = "narcpm")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").args(["init", "run"])))]
pub struct Cli {
    /// Only write the narcpm.cmake bootstrap hook into the project
    #[arg(long)]
    pub init: bool,

    /// Fetch and build every imported package, then write dependencies.cmake (default)
    #[arg(long)]
    pub run: bool,

    /// Root of the consuming project (the directory holding narcpm.config)
    #[arg(value_name = "PROJECT_ROOT")]
    pub project_root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Installation root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Registry checkout to read package descriptors from
    #[arg(long, value_name = "DIR")]
    pub registry_root: Option<PathBuf>,

    /// Directory holding cloned and built packages
    #[arg(long, value_name = "DIR")]
    pub cache_root: Option<PathBuf>,

    /// Do not clone or pull the registry
    #[arg(long)]
    pub offline: bool,

    /// Parallel build jobs passed to CMake
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Init,
    Run,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.init {
            Mode::Init
        } else {
            Mode::Run
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_is_the_default_mode() {
        let cli = Cli::try_parse_from(["narcpm", "app"]).unwrap();
        assert_eq!(cli.mode(), Mode::Run);
        assert_eq!(cli.color, ColorChoice::Auto);

        let cli = Cli::try_parse_from(["narcpm", "--init", "app"]).unwrap();
        assert_eq!(cli.mode(), Mode::Init);
    }

    #[test]
    fn test_modes_are_exclusive() {
        assert!(Cli::try_parse_from(["narcpm", "--init", "--run", "app"]).is_err());
    }

    #[test]
    fn test_project_root_is_required() {
        assert!(Cli::try_parse_from(["narcpm", "--run"]).is_err());
    }
}
