//! SPIR-V baking into C headers
//!
//! Compiled shader modules are embedded into the engine as `u32` arrays.
//! Shaders declaring the same generated file name share one header. After a
//! bake the top level of `baked_shaders/` holds exactly the headers written by
//! this run plus `WARNING.txt`; anything else there is deleted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::UserConfiguration;
use crate::error::{BuildError, BuildResult};
use crate::platform::posix_path;
use crate::root::ProjectLayout;
use crate::shader::{is_header_file_name, ShaderRecord};

/// SPIR-V magic number as read on a host of the same byte order
pub const SPIRV_MAGIC: u32 = 0x0723_0203;
/// SPIR-V magic number as read on a host of the opposite byte order
pub const SPIRV_MAGIC_SWAPPED: u32 = 0x0302_2307;

/// Engine type every baked shader is declared as
pub const SHADER_STRUCT: &str = "uVulkanShader";
/// Prefix of the engine's shader type enum
pub const STAGE_ENUM_PREFIX: &str = "uVK_SHADER_TYPE_";

pub const WARNING_FILE_NAME: &str = "WARNING.txt";

const BANNER: &str = "//\n// This file is autogenerated; content changes will be overwritten.\n//\n";
const INCLUDES: &str = "#include <shader_tools.h>\n#include <type_tools.h>";
const WARNING_TEXT: &str = "!!\n!! WARNING\n!!\n\n\
                            - The top-level of this directory is for auto generated baked shaders only.\n\
                            - For build tool compilation, top-level files which were not generated by that compilation will be deleted.\n\
                            - Subdirectories with contents will remain unaffected.\n";

const WORDS_PER_LINE: usize = 8;

/// Result of a bake
#[derive(Debug, Default)]
pub struct BakeOutcome {
    /// Headers written this run
    pub written: BTreeSet<PathBuf>,
    /// Stale entries deleted from the output directory
    pub removed: Vec<PathBuf>,
}

/// Reinterpret a SPIR-V module as 32-bit words, checking size and magic
pub fn decode_spirv(path: &Path, bytes: &[u8]) -> BuildResult<Vec<u32>> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(BuildError::SpirvSize {
            path: path.to_path_buf(),
            size: bytes.len(),
        });
    }

    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if words[0] != SPIRV_MAGIC && words[0] != SPIRV_MAGIC_SWAPPED {
        return Err(BuildError::SpirvMagic {
            path: path.to_path_buf(),
            word: words[0],
        });
    }
    Ok(words)
}

/// Append the array and struct definitions of one shader
fn render_shader(out: &mut String, record: &ShaderRecord, words: &[u32]) -> BuildResult<()> {
    let name = &record.common_name;

    writeln!(out, "const u32 {name}_data[{}] = {{", words.len())?;
    for line in words.chunks(WORDS_PER_LINE) {
        let line: Vec<String> = line.iter().map(u32::to_string).collect();
        writeln!(out, "    {},", line.join(", "))?;
    }
    writeln!(out, "}};")?;

    writeln!(out, "{SHADER_STRUCT} {name} = {{")?;
    writeln!(out, "    .name = \"{name}\",")?;
    writeln!(out, "    .data = &{name}_data[0],")?;
    writeln!(out, "    .data_size = {},", words.len() * 4)?;
    writeln!(out, "    .type = {STAGE_ENUM_PREFIX}{},", record.stage)?;
    writeln!(out, "    .module = {{}}")?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    Ok(())
}

/// Full text of one generated header
pub fn render_header(profile_label: &str, shaders: &[(&ShaderRecord, &[u32])]) -> BuildResult<String> {
    let mut out = String::from(BANNER);
    for (record, _) in shaders {
        writeln!(out, "// {}: {}", record.common_name, posix_path(&record.source))?;
    }
    writeln!(out, "// Compilation: {profile_label}")?;
    writeln!(out, "//")?;
    writeln!(out)?;
    writeln!(out, "{INCLUDES}")?;
    writeln!(out)?;
    for (record, words) in shaders {
        render_shader(&mut out, record, words)?;
    }
    Ok(out)
}

/// Bake every shader record into its header under `baked_shaders/`
///
/// All binaries are read and validated before anything is written. Deleted
/// stale headers are also dropped from `headers`.
pub fn bake_shaders(
    layout: &ProjectLayout,
    config: &UserConfiguration,
    records: &mut [ShaderRecord],
    headers: &mut BTreeSet<PathBuf>,
) -> BuildResult<BakeOutcome> {
    config.validate()?;

    let mut modules: Vec<Vec<u32>> = Vec::with_capacity(records.len());
    for record in records.iter() {
        if !is_header_file_name(&record.generated_file_name) {
            return Err(BuildError::InvalidGeneratedFileName {
                path: record.source.clone(),
                value: record.generated_file_name.clone(),
            });
        }
        let binary = record
            .binary_path
            .as_ref()
            .ok_or_else(|| BuildError::MissingBinary(record.source.clone()))?;
        let bytes = fs::read(binary).map_err(|e| BuildError::io("failed to read", binary, e))?;
        modules.push(decode_spirv(binary, &bytes)?);
    }

    let baked_dir = layout.baked_dir();
    fs::create_dir_all(&baked_dir).map_err(|e| BuildError::io("failed to create", &baked_dir, e))?;

    let mut groups: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        groups
            .entry(baked_dir.join(&record.generated_file_name))
            .or_default()
            .push(index);
    }

    let mut outcome = BakeOutcome::default();
    for (path, members) in &groups {
        let shaders: Vec<(&ShaderRecord, &[u32])> = members
            .iter()
            .map(|&i| (&records[i], modules[i].as_slice()))
            .collect();
        let text = render_header(config.profile_label(), &shaders)?;

        fs::write(path, text).map_err(|e| BuildError::io("failed to write", path, e))?;
        tracing::debug!("Baked {} shader(s) into {}", members.len(), path.display());
        outcome.written.insert(path.clone());
    }

    for (path, members) in &groups {
        for &index in members {
            records[index].output_path = Some(path.clone());
        }
    }

    outcome.removed = remove_stale(&baked_dir, &outcome.written, headers)?;

    let warning = baked_dir.join(WARNING_FILE_NAME);
    fs::write(&warning, WARNING_TEXT).map_err(|e| BuildError::io("failed to write", &warning, e))?;

    tracing::info!(
        "Baked {} shader(s) into {} header(s)",
        records.len(),
        outcome.written.len()
    );
    Ok(outcome)
}

/// Delete top-level files and empty directories not written this run
fn remove_stale(
    baked_dir: &Path,
    written: &BTreeSet<PathBuf>,
    headers: &mut BTreeSet<PathBuf>,
) -> BuildResult<Vec<PathBuf>> {
    let entries =
        fs::read_dir(baked_dir).map_err(|e| BuildError::io("failed to read", baked_dir, e))?;

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io("failed to read", baked_dir, e))?;
        let path = entry.path();
        if written.contains(&path) {
            continue;
        }

        let file_type = entry
            .file_type()
            .map_err(|e| BuildError::io("failed to inspect", &path, e))?;
        if file_type.is_file() {
            fs::remove_file(&path).map_err(|e| BuildError::io("failed to remove", &path, e))?;
        } else if file_type.is_dir() && is_empty_dir(&path)? {
            fs::remove_dir(&path).map_err(|e| BuildError::io("failed to remove", &path, e))?;
        } else {
            continue;
        }

        headers.remove(&path);
        tracing::info!("Removed stale baked output {}", path.display());
        removed.push(path);
    }
    removed.sort();
    Ok(removed)
}

fn is_empty_dir(path: &Path) -> BuildResult<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| BuildError::io("failed to read", path, e))?;
    Ok(entries.next().is_none())
}
