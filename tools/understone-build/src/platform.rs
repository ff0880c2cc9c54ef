//! Host platform family
//!
//! Selected once at startup; generators take it as a value so both
//! families can be exercised from tests on any host.

use std::path::Path;

/// Platform family the invocations are generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    /// The platform this binary was built for
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::Posix => "POSIX",
        }
    }

    /// File name of an executable called `stem`
    pub fn executable_name(self, stem: &str) -> String {
        match self {
            Platform::Windows => format!("{stem}.exe"),
            Platform::Posix => stem.to_string(),
        }
    }

    /// Shell redirection that discards both output streams
    pub fn silence(self) -> &'static str {
        match self {
            Platform::Windows => ">nul 2>&1",
            Platform::Posix => "> /dev/null 2>&1",
        }
    }
}

/// Render a path with forward slashes, the form every generated command uses
pub fn posix_path(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// [`posix_path`] in double quotes, as a single shell word
pub fn quoted(path: impl AsRef<Path>) -> String {
    format!("\"{}\"", posix_path(path))
}
