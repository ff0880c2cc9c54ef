//! Understone build orchestrator
//!
//! Builds the Understone engine from a checkout located anywhere above the
//! current directory:
//!
//! 1. Locate the project root ([`root`])
//! 2. Scan `source/` for sources, headers and shaders ([`scan`], [`shader`])
//! 3. Resolve the configuration ([`config`], [`cli`])
//! 4. Compile shaders with glslc ([`invocation::shader`])
//! 5. Bake the SPIR-V into C headers ([`bake`])
//! 6. Compile the engine with clang or clang-cl ([`invocation::source`])
//! 7. Optionally format, analyze and launch ([`invocation::format`], [`analysis`])
//!
//! [`pipeline::Pipeline`] runs the stages in order; every stage returns a
//! [`error::BuildResult`] and the first failure ends the build.

pub mod analysis;
pub mod bake;
pub mod cli;
pub mod config;
pub mod error;
pub mod invocation;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod root;
pub mod scan;
pub mod shader;
pub mod toolchain;

pub use error::{BuildError, BuildResult, ErrorKind};
pub use pipeline::Pipeline;
