//! Command line generation for the external toolchains
//!
//! Each generator probes for its tool, then assembles one shell command line
//! from the discovered files and the validated configuration:
//!
//! - [`shader`] - glslc, one `&&`-chained sub-command per shader
//! - [`source`] - clang++ or clang-cl over all engine sources
//! - [`format`] - clang-format over sources, headers and baked shaders
//! - [`sdk`] - Vulkan SDK discovery feeding the source invocation

pub mod format;
pub mod sdk;
pub mod shader;
pub mod source;

use std::fmt;

use crate::error::BuildResult;
use crate::process::CommandRunner;

/// A generated command line, tagged with the stage that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: &'static str,
    pub command: String,
}

impl Invocation {
    pub fn new(stage: &'static str, parts: Vec<String>) -> Self {
        Self {
            stage,
            command: parts.join(" "),
        }
    }

    /// True when there was nothing to run, e.g. a tree without shaders
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }

    /// Run the command line through `runner`; empty invocations are skipped
    pub fn execute(&self, runner: &dyn CommandRunner) -> BuildResult<()> {
        if self.is_empty() {
            tracing::info!("Nothing to do for {}", self.stage);
            return Ok(());
        }
        runner.run(self.stage, &self.command)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}
