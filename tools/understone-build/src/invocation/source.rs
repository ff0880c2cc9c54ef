//! C/C++ compiler invocation for the engine sources
//!
//! Flag sets and link libraries are fixed per backend. clang-cl is only
//! available on Windows.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use super::sdk::VulkanSdk;
use super::Invocation;
use crate::config::{CompilerBackend, UserConfiguration};
use crate::error::{BuildError, BuildResult};
use crate::platform::{quoted, Platform};
use crate::root::ProjectLayout;
use crate::scan::DiscoveredFiles;
use crate::shader::ShaderRecord;
use crate::toolchain::{self, ToolProbe, CLANG, CLANG_CL};

pub const STAGE: &str = "source compilation";

/// Macro defined for debug builds of the engine
pub const DEBUG_MACRO: &str = "__UE_debug__";

/// Warnings silenced for the engine's use of C extensions in C++
const EXTENSION_WARNINGS: &str = "-Wno-gnu-anonymous-struct -Wno-nested-anon-types \
                                  -Wno-gnu-zero-variadic-macro-arguments -Wno-c99-extensions";

/// Fixed flag table of one compiler backend
struct BackendProfile {
    warnings: &'static str,
    debug: &'static str,
    release: &'static str,
}

const CLANG_PROFILE: BackendProfile = BackendProfile {
    warnings: "-Wall -Werror -pedantic -std=c++20",
    debug: "-g3 -O0",
    release: "-g0 -O3",
};

const CLANG_CL_PROFILE: BackendProfile = BackendProfile {
    warnings: "-WX -W4 /std:c++latest",
    debug: "-Od -MTd -Zi",
    release: "-MT -O2 -Ot -Ob2",
};

const CLANG_CL_LINK: &str =
    "-link -SUBSYSTEM:CONSOLE -NXCOMPAT -MACHINE:x64 -NODEFAULTLIB:MSVCRTD user32.lib vulkan-1.lib";

fn clang_libraries(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "-lvulkan-1.lib -luser32.lib",
        Platform::Posix => "-lvulkan",
    }
}

/// Directories holding the baked shader headers; each header must exist
fn baked_include_dirs(records: &[ShaderRecord]) -> BuildResult<BTreeSet<PathBuf>> {
    let mut dirs = BTreeSet::new();
    for record in records {
        let output = record
            .output_path
            .as_ref()
            .ok_or_else(|| BuildError::MissingBakedOutput(record.source.clone()))?;
        if !output.is_file() {
            return Err(BuildError::MissingBakedOutput(output.clone()));
        }
        if let Some(dir) = output.parent() {
            dirs.insert(dir.to_path_buf());
        }
    }
    Ok(dirs)
}

/// Generate the engine compilation command
pub fn generate(
    probe: &dyn ToolProbe,
    platform: Platform,
    layout: &ProjectLayout,
    config: &UserConfiguration,
    files: &DiscoveredFiles,
    records: &[ShaderRecord],
    sdk: &VulkanSdk,
) -> BuildResult<Invocation> {
    config.validate()?;

    let (tool, profile) = match (config.compiler, platform) {
        (CompilerBackend::Clang, _) => (&CLANG, &CLANG_PROFILE),
        (CompilerBackend::ClangCl, Platform::Windows) => (&CLANG_CL, &CLANG_CL_PROFILE),
        (CompilerBackend::ClangCl, Platform::Posix) => {
            return Err(BuildError::UnsupportedBackend {
                backend: CompilerBackend::ClangCl.name(),
                platform: platform.name(),
            })
        }
    };
    let exe = toolchain::resolve(probe, tool, platform)?;

    let baked_dirs = baked_include_dirs(records)?;

    let bin_dir = layout.bin_dir();
    fs::create_dir_all(&bin_dir).map_err(|e| BuildError::io("failed to create", &bin_dir, e))?;
    let output = quoted(layout.engine_executable(platform));

    let mut parts = vec![exe, profile.warnings.to_string(), EXTENSION_WARNINGS.to_string()];
    if config.is_debug() {
        parts.push(format!("{} -D{DEBUG_MACRO}=1", profile.debug));
    } else {
        parts.push(profile.release.to_string());
    }

    parts.extend(files.sources.iter().map(quoted));
    parts.extend(files.header_dirs.iter().map(|d| format!("-I{}", quoted(d))));
    if let Some(sdk_path) = sdk.path() {
        parts.push(format!("-I{}", quoted(sdk_path.join("Include"))));
    }
    parts.extend(baked_dirs.iter().map(|d| format!("-I{}", quoted(d))));

    match config.compiler {
        CompilerBackend::Clang => {
            if let Some(sdk_path) = sdk.path() {
                parts.push(format!("-L{}", quoted(sdk_path.join("Lib"))));
            }
            parts.push(clang_libraries(platform).to_string());
            parts.push(format!("-o {output}"));
        }
        CompilerBackend::ClangCl => {
            parts.push(format!("-Fe{output}"));
            parts.push(CLANG_CL_LINK.to_string());
            if let Some(sdk_path) = sdk.path() {
                parts.push(format!("-LIBPATH:{}", quoted(sdk_path.join("Lib"))));
            }
        }
    }

    let invocation = Invocation::new(STAGE, parts);
    tracing::debug!("Source invocation: {invocation}");
    Ok(invocation)
}
