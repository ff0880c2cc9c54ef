//! Error taxonomy for the build pipeline
//!
//! Every stage returns [`BuildError`]; the first error aborts the run.
//! [`BuildError::kind`] groups variants into the classes reported to the user.

use std::path::{Path, PathBuf};

use crate::shader::HEADER_TEMPLATE;

/// Result alias used by every pipeline stage
pub type BuildResult<T> = Result<T, BuildError>;

/// Broad class of a build failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required external tool is missing
    Environment,
    /// Malformed or duplicate shader metadata
    Metadata,
    /// Compiled shader binary failed validation
    BinaryIntegrity,
    /// Missing root, unreadable or unwritable paths
    Filesystem,
    /// Bad command line or config file value
    Configuration,
    /// Configuration reached a stage in an inconsistent state
    Validation,
    /// An external command ran but reported failure
    Execution,
}

impl ErrorKind {
    /// Short label used as the diagnostic prefix
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Environment => "environment",
            ErrorKind::Metadata => "metadata",
            ErrorKind::BinaryIntegrity => "binary",
            ErrorKind::Filesystem => "filesystem",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::Execution => "execution",
        }
    }
}

/// Failure of a single pipeline stage
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot use {tool}, please ensure it is in the system environment path{hint}")]
    ToolNotFound { tool: String, hint: String },

    #[error("unable to find the project root along any ancestor of: {}", start.display())]
    RootNotFound { start: PathBuf },

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required directory: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error(
        "the shader at {} has common name \"{name}\", which is already used by {}; shaders must have unique names",
        second.display(),
        first.display()
    )]
    DuplicateShaderName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("the shader at {} has shader type \"{value}\", which is invalid; valid types are: VERTEX, FRAGMENT", path.display())]
    InvalidShaderStage { path: PathBuf, value: String },

    #[error(
        "the shader at {} has generated file name \"{value}\", which is not a plain header file name; known header extensions are: .h .hpp",
        path.display()
    )]
    InvalidGeneratedFileName { path: PathBuf, value: String },

    #[error(
        "unable to parse shader header for file: {}\nall shaders are required to have commented headers in the form:\n{}",
        path.display(),
        HEADER_TEMPLATE
    )]
    MissingShaderHeader { path: PathBuf },

    #[error(
        "the shaders {} and {} would both compile to {}; shader file names must be unique",
        first.display(),
        second.display(),
        binary.display()
    )]
    ConflictingShaderBinary {
        binary: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(
        "the shader at {} has common name \"{value}\", which is not a valid C identifier",
        path.display()
    )]
    InvalidCommonName { path: PathBuf, value: String },

    #[error("unable to match shader source {} with a compiled SPIR-V module", .0.display())]
    UnmappedShader(PathBuf),

    #[error("the shader source {} was sent for baking without an associated SPIR-V module", .0.display())]
    MissingBinary(PathBuf),

    #[error("invalid SPIR-V file size for {}: {size} bytes is not a multiple of four", path.display())]
    SpirvSize { path: PathBuf, size: usize },

    #[error("invalid SPIR-V magic number {word:#010x} in {}", path.display())]
    SpirvMagic { path: PathBuf, word: u32 },

    #[error("failed to render generated source: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("unable to locate a baked shader listed for compilation: {}", .0.display())]
    MissingBakedOutput(PathBuf),

    #[error("unable to locate a Vulkan SDK installation: {0}; please specify the precise path with -vulkan_sdk")]
    SdkNotFound(String),

    #[error("{backend} is not supported on {platform} systems")]
    UnsupportedBackend {
        backend: &'static str,
        platform: &'static str,
    },

    #[error("failed to parse {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration value: {0}")]
    InvalidConfiguration(String),

    #[error("the following configuration failed the sanity check:\n{0}")]
    Validation(String),

    #[error("{stage} failed (exit code: {})", code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    CommandFailed {
        stage: &'static str,
        code: Option<i32>,
    },
}

impl BuildError {
    /// Wrap an I/O error together with the path it concerns
    pub fn io(action: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        BuildError::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::ToolNotFound { .. } => ErrorKind::Environment,
            BuildError::RootNotFound { .. }
            | BuildError::Io { .. }
            | BuildError::MissingDirectory(_)
            | BuildError::MissingBakedOutput(_)
            | BuildError::Render(_) => ErrorKind::Filesystem,
            BuildError::DuplicateShaderName { .. }
            | BuildError::InvalidShaderStage { .. }
            | BuildError::InvalidGeneratedFileName { .. }
            | BuildError::InvalidCommonName { .. }
            | BuildError::ConflictingShaderBinary { .. }
            | BuildError::MissingShaderHeader { .. } => ErrorKind::Metadata,
            BuildError::UnmappedShader(_)
            | BuildError::MissingBinary(_)
            | BuildError::SpirvSize { .. }
            | BuildError::SpirvMagic { .. } => ErrorKind::BinaryIntegrity,
            BuildError::SdkNotFound(_) => ErrorKind::Environment,
            BuildError::UnsupportedBackend { .. }
            | BuildError::ConfigFile { .. }
            | BuildError::InvalidConfiguration(_) => ErrorKind::Configuration,
            BuildError::Validation(_) => ErrorKind::Validation,
            BuildError::CommandFailed { .. } => ErrorKind::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_mentions_both_files() {
        let err = BuildError::DuplicateShaderName {
            name: "basic".to_string(),
            first: PathBuf::from("a/basic.vert"),
            second: PathBuf::from("b/basic.vert"),
        };
        let msg = err.to_string();
        assert!(msg.contains("a/basic.vert"));
        assert!(msg.contains("b/basic.vert"));
        assert_eq!(err.kind(), ErrorKind::Metadata);
    }

    #[test]
    fn test_missing_header_shows_template() {
        let err = BuildError::MissingShaderHeader {
            path: PathBuf::from("x.frag"),
        };
        assert!(err.to_string().contains(HEADER_TEMPLATE));
    }

    #[test]
    fn test_command_failed_unknown_code() {
        let err = BuildError::CommandFailed {
            stage: "shader compilation",
            code: None,
        };
        assert!(err.to_string().contains("exit code: unknown"));
        assert_eq!(err.kind().label(), "execution");
    }
}
