//! glslc invocation
//!
//! Every shader compiles to `<root>/bin/shaders/<stem>_<ext>.spv`, keeping the
//! original extension in the name so `basic.vert` and `basic.frag` cannot
//! collide. Two sources with the same file name in different directories
//! would share a binary and are rejected. The per-shader commands are chained
//! with `&&`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::Invocation;
use crate::config::{ShaderCompilerBackend, UserConfiguration};
use crate::error::{BuildError, BuildResult};
use crate::platform::{quoted, Platform};
use crate::root::ProjectLayout;
use crate::shader::ShaderRecord;
use crate::toolchain::{self, ToolProbe, GLSLC};

pub const STAGE: &str = "shader compilation";

const DEBUG_FLAGS: &str = "-g -O0";
const RELEASE_FLAGS: &str = "-O";

/// SPIR-V output path for the shader source `source`
pub fn binary_path(output_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{stem}_{}.spv", ext.to_string_lossy()),
        None => format!("{stem}.spv"),
    };
    output_dir.join(name)
}

/// Generate the shader compilation command and record each shader's binary
///
/// `shaders` is the discovered shader file set; every record must belong to
/// it, since the record's binary path is looked up by source path.
pub fn generate(
    probe: &dyn ToolProbe,
    platform: Platform,
    layout: &ProjectLayout,
    config: &UserConfiguration,
    shaders: &BTreeSet<PathBuf>,
    records: &mut [ShaderRecord],
) -> BuildResult<Invocation> {
    config.validate()?;

    let exe = match config.shader_compiler {
        ShaderCompilerBackend::Glslc => toolchain::resolve(probe, &GLSLC, platform)?,
    };

    let output_dir = layout.shader_bin_dir();
    fs::create_dir_all(&output_dir)
        .map_err(|e| BuildError::io("failed to create", &output_dir, e))?;

    let profile_flags = if config.is_debug() {
        DEBUG_FLAGS
    } else {
        RELEASE_FLAGS
    };

    let mut binaries: BTreeMap<&Path, PathBuf> = BTreeMap::new();
    let mut claimed: BTreeMap<PathBuf, &Path> = BTreeMap::new();
    let mut commands = Vec::with_capacity(shaders.len());
    for source in shaders {
        let binary = binary_path(&output_dir, source);
        if let Some(first) = claimed.insert(binary.clone(), source.as_path()) {
            return Err(BuildError::ConflictingShaderBinary {
                binary,
                first: first.to_path_buf(),
                second: source.clone(),
            });
        }
        commands.push(format!(
            "{exe} -Werror {profile_flags} {} -o {}",
            quoted(source),
            quoted(&binary)
        ));
        binaries.insert(source.as_path(), binary);
    }

    for record in records.iter_mut() {
        let binary = binaries
            .get(record.source.as_path())
            .ok_or_else(|| BuildError::UnmappedShader(record.source.clone()))?;
        record.binary_path = Some(binary.clone());
    }

    let invocation = Invocation {
        stage: STAGE,
        command: commands.join(" && "),
    };
    tracing::debug!("Shader invocation: {invocation}");
    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{ShaderHeader, ShaderStage};
    use tempfile::tempdir;

    struct AllTools;

    impl ToolProbe for AllTools {
        fn responds(&self, _executable: &str) -> bool {
            true
        }
    }

    struct NoTools;

    impl ToolProbe for NoTools {
        fn responds(&self, _executable: &str) -> bool {
            false
        }
    }

    fn record(source: &Path, name: &str) -> ShaderRecord {
        ShaderRecord::new(
            source.to_path_buf(),
            ShaderHeader {
                common_name: name.to_string(),
                stage: ShaderStage::Vertex,
                generated_file_name: "shaders.h".to_string(),
            },
        )
    }

    #[test]
    fn test_binary_name_keeps_extension() {
        let out = binary_path(Path::new("/r/bin/shaders"), Path::new("/r/source/basic.frag"));
        assert_eq!(out, PathBuf::from("/r/bin/shaders/basic_frag.spv"));
    }

    #[test]
    fn test_generate_chains_and_backfills() {
        let temp = tempdir().unwrap();
        let layout = ProjectLayout::new(temp.path());
        let vert = temp.path().join("source/basic.vert");
        let frag = temp.path().join("source/basic.frag");
        let shaders = BTreeSet::from([vert.clone(), frag.clone()]);
        let mut records = vec![record(&vert, "basic_vert"), record(&frag, "basic_frag")];

        let invocation = generate(
            &AllTools,
            Platform::Posix,
            &layout,
            &UserConfiguration::default(),
            &shaders,
            &mut records,
        )
        .unwrap();

        assert!(layout.shader_bin_dir().is_dir());
        assert_eq!(invocation.command.matches(" && ").count(), 1);
        assert!(invocation.command.starts_with("glslc -Werror -g -O0 "));
        assert_eq!(
            records[0].binary_path,
            Some(layout.shader_bin_dir().join("basic_vert.spv"))
        );
        assert_eq!(
            records[1].binary_path,
            Some(layout.shader_bin_dir().join("basic_frag.spv"))
        );
    }

    #[test]
    fn test_release_flags() {
        let temp = tempdir().unwrap();
        let layout = ProjectLayout::new(temp.path());
        let vert = temp.path().join("a.vert");
        let mut config = UserConfiguration::default();
        config.set_profile(crate::config::Profile::Release);

        let invocation = generate(
            &AllTools,
            Platform::Posix,
            &layout,
            &config,
            &BTreeSet::from([vert]),
            &mut [],
        )
        .unwrap();
        assert!(invocation.command.starts_with("glslc -Werror -O "));
    }

    #[test]
    fn test_unmapped_record_is_fatal() {
        let temp = tempdir().unwrap();
        let layout = ProjectLayout::new(temp.path());
        let mut records = vec![record(&temp.path().join("stray.vert"), "stray")];

        let err = generate(
            &AllTools,
            Platform::Posix,
            &layout,
            &UserConfiguration::default(),
            &BTreeSet::new(),
            &mut records,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::UnmappedShader(_)));
    }

    #[test]
    fn test_same_file_name_in_two_directories_is_fatal() {
        let temp = tempdir().unwrap();
        let first = temp.path().join("source/a/basic.vert");
        let second = temp.path().join("source/b/basic.vert");

        let err = generate(
            &AllTools,
            Platform::Posix,
            &ProjectLayout::new(temp.path()),
            &UserConfiguration::default(),
            &BTreeSet::from([first.clone(), second.clone()]),
            &mut [],
        )
        .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Metadata);
        let message = err.to_string();
        assert!(message.contains(&first.display().to_string()), "{message}");
        assert!(message.contains(&second.display().to_string()), "{message}");
        assert!(message.contains("basic_vert.spv"), "{message}");
    }

    #[test]
    fn test_paths_with_spaces_stay_single_words() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("my projects/understone");
        let layout = ProjectLayout::new(&root);
        let vert = root.join("source/basic.vert");

        let invocation = generate(
            &AllTools,
            Platform::Posix,
            &layout,
            &UserConfiguration::default(),
            &BTreeSet::from([vert.clone()]),
            &mut [],
        )
        .unwrap();

        assert!(invocation.command.ends_with(&format!(
            "{} -o {}",
            quoted(&vert),
            quoted(layout.shader_bin_dir().join("basic_vert.spv"))
        )));
    }

    #[test]
    fn test_missing_glslc() {
        let temp = tempdir().unwrap();
        let err = generate(
            &NoTools,
            Platform::Posix,
            &ProjectLayout::new(temp.path()),
            &UserConfiguration::default(),
            &BTreeSet::new(),
            &mut [],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::ToolNotFound { .. }));
    }
}
