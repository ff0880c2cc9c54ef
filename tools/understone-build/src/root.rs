//! Project root discovery
//!
//! Starting at a directory, every ancestor is visited walking upward. At each
//! ancestor the grandchild directories (children of its child directories)
//! are checked for the root layout:
//!
//! ```text
//! <root>/build/
//! <root>/analysis/
//! <root>/source/<entry point>
//! ```
//!
//! Unreadable directories and directories without any permission bits for
//! other users are skipped silently.

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Entry point source file that marks the engine's source directory
pub const ENTRY_POINT: &str = "Understone.cpp";

/// Name of the built engine executable, without extension
pub const ENGINE_NAME: &str = "Understone";

/// Well-known paths below a located project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join("source")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Compiled SPIR-V modules
    pub fn shader_bin_dir(&self) -> PathBuf {
        self.bin_dir().join("shaders")
    }

    /// Generated shader headers
    pub fn baked_dir(&self) -> PathBuf {
        self.source_dir().join("shaders").join("baked_shaders")
    }

    pub fn analysis_report(&self) -> PathBuf {
        self.root.join("analysis").join("analysis_results.txt")
    }

    /// The engine binary produced by the source compilation
    pub fn engine_executable(&self, platform: Platform) -> PathBuf {
        self.bin_dir().join(platform.executable_name(ENGINE_NAME))
    }
}

/// Whether `candidate` has the root directory layout
pub fn is_project_root(candidate: &Path, entry_point: &str) -> bool {
    candidate.join("build").is_dir()
        && candidate.join("analysis").is_dir()
        && candidate.join("source").is_dir()
        && candidate.join("source").join(entry_point).is_file()
}

/// Search the ancestors of `start` for the project root
///
/// Returns the first qualifying directory, or `None` once the filesystem root
/// has been searched without a match.
pub fn locate_root(start: &Path, entry_point: &str) -> Option<PathBuf> {
    for ancestor in start.ancestors() {
        for child in list_directories(ancestor) {
            if let Some(found) = list_directories(&child)
                .into_iter()
                .filter(|grandchild| accessible_to_others(grandchild))
                .find(|grandchild| is_project_root(grandchild, entry_point))
            {
                return Some(found);
            }
        }
    }
    None
}

/// Child directories of `dir` in name order; errors yield an empty list
fn list_directories(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    dirs
}

#[cfg(unix)]
fn accessible_to_others(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(dir)
        .map(|m| m.permissions().mode() & 0o007 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn accessible_to_others(dir: &Path) -> bool {
    fs::metadata(dir).is_ok()
}
