//! External toolchain discovery
//!
//! A tool is usable when one of its candidate executable names answers
//! `--version` with exit code 0. Candidates are tried in order.

use crate::error::{BuildError, BuildResult};
use crate::platform::Platform;
use crate::process::ProcessRunner;

/// An external executable the pipeline depends on
#[derive(Debug, Clone, Copy)]
pub struct Tool {
    /// Display name used in diagnostics
    pub name: &'static str,
    /// Executable names to try, most likely first
    pub candidates: &'static [&'static str],
    /// Extra remediation text for POSIX hosts
    pub posix_hint: Option<&'static str>,
}

pub const GLSLC: Tool = Tool {
    name: "glslc",
    candidates: &["glslc", "glslc.exe"],
    posix_hint: None,
};

pub const CLANG: Tool = Tool {
    name: "clang",
    candidates: &["clang++", "clang++.exe"],
    posix_hint: None,
};

pub const CLANG_CL: Tool = Tool {
    name: "clang-cl",
    candidates: &["clang-cl", "clang-cl.exe"],
    posix_hint: None,
};

// clang and clang++ are symlinked to the current version by most installs,
// clang-format usually is not.
pub const CLANG_FORMAT: Tool = Tool {
    name: "clang-format",
    candidates: &["clang-format", "clang-format.exe"],
    posix_hint: Some(
        "create a symlink in /usr/bin/ named 'clang-format' pointing to your installed version",
    ),
};

/// Answers whether an executable is present and working
pub trait ToolProbe {
    /// Whether `<executable> --version` exits with status 0
    fn responds(&self, executable: &str) -> bool;
}

impl ToolProbe for ProcessRunner {
    fn responds(&self, executable: &str) -> bool {
        let command = format!("{executable} --version {}", Platform::host().silence());
        match self.capture(&command) {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!("probe of {executable} failed: {e}");
                false
            }
        }
    }
}

/// Find the first responding candidate of `tool`
pub fn resolve(probe: &dyn ToolProbe, tool: &Tool, platform: Platform) -> BuildResult<String> {
    for candidate in tool.candidates {
        if probe.responds(candidate) {
            match which::which(candidate) {
                Ok(path) => tracing::debug!("using {} at {}", tool.name, path.display()),
                Err(_) => tracing::debug!("using {} as '{candidate}'", tool.name),
            }
            return Ok(candidate.to_string());
        }
        tracing::debug!("'{candidate}' did not respond to --version");
    }

    let hint = match (platform, tool.posix_hint) {
        (Platform::Posix, Some(hint)) => format!("\nnote: {hint}"),
        _ => String::new(),
    };
    Err(BuildError::ToolNotFound {
        tool: tool.name.to_string(),
        hint,
    })
}
