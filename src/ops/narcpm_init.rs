//! Implementation of `narcpm --init`.
//!
//! Writes a CMake hook into the consuming project. Including it runs narcpm
//! at configure time and then pulls in the generated `dependencies.cmake`:
//!
//! ```cmake
//! include(${CMAKE_SOURCE_DIR}/narcpm.cmake)
//! target_link_libraries(app glfw_core glm)
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::ConfigError;
use crate::ops::render::DEPENDENCIES_FILE;
use crate::util::context::GlobalContext;
use crate::util::fs::write_atomic;

/// File name of the bootstrap hook inside the project root.
pub const HOOK_FILE: &str = "narcpm.cmake";

/// Render the hook that runs `program --run <project_root>` from the
/// installation root.
pub fn render_hook(program: &Path, install_root: &Path, project_root: &Path) -> String {
    format!(
        r#"# Generated by narcpm --init. Include this file from CMakeLists.txt.
execute_process(
	COMMAND "{program}" --run "{project}"
	WORKING_DIRECTORY "{root}"
	RESULT_VARIABLE NARCPM_RESULT)
if(NOT NARCPM_RESULT EQUAL 0)
	message(FATAL_ERROR "narcpm failed (${{NARCPM_RESULT}})")
endif()

include(${{CMAKE_CURRENT_LIST_DIR}}/{deps})
"#,
        program = program.display(),
        project = project_root.display(),
        root = install_root.display(),
        deps = DEPENDENCIES_FILE,
    )
}

/// Write `<project_root>/narcpm.cmake`. Returns the path written.
pub fn init(ctx: &GlobalContext, project_root: &Path, program: &Path) -> Result<PathBuf> {
    if !project_root.is_dir() {
        return Err(ConfigError::DirectoryNotFound {
            path: project_root.to_path_buf(),
        }
        .into());
    }

    let path = project_root.join(HOOK_FILE);
    write_atomic(&path, &render_hook(program, ctx.root(), project_root))?;
    tracing::info!("wrote {}", path.display());
    Ok(path)
}
