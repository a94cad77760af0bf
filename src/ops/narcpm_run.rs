//! Implementation of `narcpm --run`.

use std::path::Path;

use anyhow::Result;

use crate::core::Manifest;
use crate::ops::orchestrate::{Orchestrator, RunReport};
use crate::ops::registry::sync_registry;
use crate::ops::render::{render_dependencies, DEPENDENCIES_FILE};
use crate::sources::CacheLock;
use crate::util::context::GlobalContext;
use crate::util::process::CommandRunner;
use crate::util::shell::{Shell, Status};

/// Bring every imported package up to date and write `dependencies.cmake`.
///
/// The manifest is loaded before anything touches the network or the
/// cache, so configuration errors leave both untouched. The descriptor is
/// written even when some packages failed; it declares only the ones that
/// succeeded. Check [`RunReport::has_failures`] for the overall outcome.
pub fn run(
    ctx: &GlobalContext,
    project_root: &Path,
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<RunReport> {
    let span = shell.span();
    let manifest = Manifest::load(project_root)?;
    tracing::debug!(
        "{} imports {} package(s)",
        manifest.path().display(),
        manifest.imports().len()
    );

    let _lock = CacheLock::acquire(ctx.cache_root())?;
    sync_registry(ctx, runner, shell)?;

    let layout = ctx.layout();
    let config = ctx.config();
    let matrix = config.matrix();
    let report = Orchestrator::new(&layout, &matrix, runner, shell)
        .generator(config.generator())
        .jobs(config.jobs())
        .run(manifest)?;

    let count = render_dependencies(project_root, &matrix, report.succeeded())?;
    shell.status(
        Status::Writing,
        format!("{} ({} target(s))... done", DEPENDENCIES_FILE, count),
    );

    span.finish_with_message(format!(
        "{} package(s), {} failed,",
        report.packages.len(),
        report.failed().count()
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConfigError, MANIFEST_NAME};
    use crate::sources::lock::LOCK_FILE;
    use crate::test_support::{MockRunner, RegistryFixture};
    use crate::util::config::Config;

    fn context(fixture: &RegistryFixture) -> GlobalContext {
        let mut ctx = GlobalContext::with_config(fixture.root(), Config::default());
        ctx.set_offline(true);
        ctx
    }

    fn dependencies(fixture: &RegistryFixture) -> String {
        std::fs::read_to_string(fixture.project_dir().join(DEPENDENCIES_FILE)).unwrap()
    }

    #[test]
    fn test_full_run_renders_built_packages() {
        let fixture = RegistryFixture::new()
            .package("foo", "[package]\nrepository = git://x/foo\n")
            .manifest("[foo]\nstatic = true\n");
        let runner = MockRunner::new().simulate_clones();

        let report = run(&context(&fixture), &fixture.project_dir(), &runner, &Shell::quiet()).unwrap();

        assert!(!report.has_failures());
        assert!(fixture.layout().built("foo"));
        assert!(dependencies(&fixture).contains("add_library(foo STATIC IMPORTED)"));
        // The lock is released once the run is over.
        drop(CacheLock::acquire(&fixture.cache_root()).unwrap());
    }

    #[test]
    fn test_failed_package_is_not_rendered() {
        let fixture = RegistryFixture::new()
            .package("foo", "[package]\nrepository = git://x/foo\n")
            .package("bar", "[package]\nrepository = git://x/bar\n")
            .manifest("[foo]\n[bar]\n")
            .cloned("foo")
            .cloned("bar");
        let runner = MockRunner::new();
        runner.fail_matching("/cache/foo/build", 2);

        let report = run(&context(&fixture), &fixture.project_dir(), &runner, &Shell::quiet()).unwrap();

        assert!(report.has_failures());
        let output = dependencies(&fixture);
        assert!(!output.contains("add_library(foo"));
        assert!(output.contains("add_library(bar STATIC IMPORTED)"));
    }

    #[test]
    fn test_local_interface_headers_come_from_registry() {
        let fixture = RegistryFixture::new()
            .package("hdr", "[package]\ninterface = true\n")
            .manifest("[hdr]\n");
        let headers = fixture.registry_root().join("hdr/include");
        std::fs::create_dir(&headers).unwrap();

        run(&context(&fixture), &fixture.project_dir(), &MockRunner::new(), &Shell::quiet()).unwrap();

        let output = dependencies(&fixture);
        let declared = format!("\tINTERFACE_INCLUDE_DIRECTORIES \"{}\")", headers.display());
        assert!(output.contains(&declared), "{}", output);
        assert!(!output.contains("repository/include"));
    }

    #[test]
    fn test_parse_error_writes_nothing() {
        let fixture = RegistryFixture::new().manifest("foo = bar\n");
        let runner = MockRunner::new();

        let err = run(&context(&fixture), &fixture.project_dir(), &runner, &Shell::quiet()).unwrap_err();

        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Parse(_))));
        assert!(!fixture.project_dir().join(DEPENDENCIES_FILE).exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_locked_cache_fails_fast() {
        let fixture = RegistryFixture::new().manifest("[foo]\n");
        let _held = CacheLock::acquire(&fixture.cache_root()).unwrap();

        let result = run(
            &context(&fixture),
            &fixture.project_dir(),
            &MockRunner::new(),
            &Shell::quiet(),
        );

        assert!(result.unwrap_err().to_string().contains("locked"));
        assert!(!fixture.project_dir().join(DEPENDENCIES_FILE).exists());
    }

    #[test]
    fn test_lock_left_by_killed_run_does_not_block() {
        let fixture = RegistryFixture::new().manifest("[foo]\n");
        std::fs::write(fixture.cache_root().join(LOCK_FILE), "4194303\n").unwrap();

        run(&context(&fixture), &fixture.project_dir(), &MockRunner::new(), &Shell::quiet()).unwrap();

        assert!(fixture.project_dir().join(DEPENDENCIES_FILE).exists());
    }

    #[test]
    fn test_missing_manifest() {
        let fixture = RegistryFixture::new();
        assert!(!fixture.project_dir().join(MANIFEST_NAME).exists());

        let err = run(
            &context(&fixture),
            &fixture.project_dir(),
            &MockRunner::new(),
            &Shell::quiet(),
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::NotFound { .. })));
    }
}
