//! Dependency discovery under `<root>/source`
//!
//! Files are bucketed by extension. Shader files additionally have their
//! metadata header parsed into a [`ShaderRecord`]. Anything below a
//! `baked_shaders` directory is generated output and never scanned.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BuildError, BuildResult};
use crate::shader::{self, ShaderRecord, HEADER_EXTENSIONS};

/// Directory name holding generated shader sources
pub const GENERATED_DIR_NAME: &str = "baked_shaders";

pub const SOURCE_EXTENSIONS: [&str; 3] = ["c", "cpp", "cc"];
pub const SHADER_EXTENSIONS: [&str; 4] = ["vert", "frag", "geom", "tess"];

/// Extension bucket a file falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Source,
    Header,
    Shader,
}

impl FileClass {
    /// Classify by extension (without the dot); case-sensitive
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if SOURCE_EXTENSIONS.contains(&ext) {
            Some(FileClass::Source)
        } else if HEADER_EXTENSIONS.iter().any(|h| h.trim_start_matches('.') == ext) {
            Some(FileClass::Header)
        } else if SHADER_EXTENSIONS.contains(&ext) {
            Some(FileClass::Shader)
        } else {
            None
        }
    }
}

/// Every input file found under the source tree, by bucket
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    pub sources: BTreeSet<PathBuf>,
    pub headers: BTreeSet<PathBuf>,
    /// Directories containing at least one header
    pub header_dirs: BTreeSet<PathBuf>,
    pub shaders: BTreeSet<PathBuf>,
}

/// Output of [`scan_dependencies`]
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: DiscoveredFiles,
    /// One record per shader file, in path order
    pub shaders: Vec<ShaderRecord>,
}

fn is_generated_dir(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == std::ffi::OsStr::new(GENERATED_DIR_NAME))
}

/// Walk `<root>/source` and collect every dependency
pub fn scan_dependencies(root: &Path) -> BuildResult<ScanResult> {
    let source_dir = root.join("source");
    if !source_dir.is_dir() {
        return Err(BuildError::MissingDirectory(source_dir));
    }

    let mut result = ScanResult::default();
    let mut seen_names: HashMap<String, PathBuf> = HashMap::new();

    let walker = WalkDir::new(&source_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_generated_dir(e.path().strip_prefix(root).unwrap_or(e.path())));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source_dir.clone());
            BuildError::io("failed to walk", path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match FileClass::of(path) {
            Some(FileClass::Header) => {
                if let Some(dir) = path.parent() {
                    result.files.header_dirs.insert(dir.to_path_buf());
                }
                result.files.headers.insert(path.to_path_buf());
            }
            Some(FileClass::Source) => {
                result.files.sources.insert(path.to_path_buf());
            }
            Some(FileClass::Shader) => {
                let header = shader::read_header(path)?;
                if let Some(first) = seen_names.get(&header.common_name) {
                    return Err(BuildError::DuplicateShaderName {
                        name: header.common_name,
                        first: first.clone(),
                        second: path.to_path_buf(),
                    });
                }
                seen_names.insert(header.common_name.clone(), path.to_path_buf());

                result.files.shaders.insert(path.to_path_buf());
                result.shaders.push(ShaderRecord::new(path.to_path_buf(), header));
            }
            None => {}
        }
    }

    tracing::info!(
        "Found {} source, {} header and {} shader files",
        result.files.sources.len(),
        result.files.headers.len(),
        result.files.shaders.len()
    );
    Ok(result)
}
