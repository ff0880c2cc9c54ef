//! clang-format invocation over every engine file

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::Invocation;
use crate::error::{BuildError, BuildResult};
use crate::platform::{quoted, Platform};
use crate::scan::DiscoveredFiles;
use crate::shader::ShaderRecord;
use crate::toolchain::{self, ToolProbe, CLANG_FORMAT};

pub const STAGE: &str = "code formatting";

const FORMAT_FLAGS: &str = "-i -Werror --sort-includes";

/// Format sources, baked shader headers and headers in place
///
/// Several shaders may share one baked header; each file is listed once.
pub fn generate(
    probe: &dyn ToolProbe,
    platform: Platform,
    files: &DiscoveredFiles,
    records: &[ShaderRecord],
) -> BuildResult<Invocation> {
    let exe = toolchain::resolve(probe, &CLANG_FORMAT, platform)?;

    let mut baked: BTreeSet<&PathBuf> = BTreeSet::new();
    for record in records {
        let output = record
            .output_path
            .as_ref()
            .ok_or_else(|| BuildError::MissingBakedOutput(record.source.clone()))?;
        if !output.is_file() {
            return Err(BuildError::MissingBakedOutput(output.clone()));
        }
        baked.insert(output);
    }

    let mut parts = vec![exe, FORMAT_FLAGS.to_string()];
    parts.extend(files.sources.iter().map(quoted));
    parts.extend(
        baked
            .into_iter()
            .filter(|path| !files.headers.contains(*path))
            .map(quoted),
    );
    parts.extend(files.headers.iter().map(quoted));

    let invocation = Invocation::new(STAGE, parts);
    tracing::debug!("Format invocation: {invocation}");
    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{ShaderHeader, ShaderStage};
    use std::fs;
    use tempfile::tempdir;

    struct Responds(&'static [&'static str]);

    impl ToolProbe for Responds {
        fn responds(&self, executable: &str) -> bool {
            self.0.contains(&executable)
        }
    }

    fn record(name: &str, output: PathBuf) -> ShaderRecord {
        let mut record = ShaderRecord::new(
            PathBuf::from(format!("{name}.vert")),
            ShaderHeader {
                common_name: name.to_string(),
                stage: ShaderStage::Vertex,
                generated_file_name: "shaders.h".to_string(),
            },
        );
        record.output_path = Some(output);
        record
    }

    #[test]
    fn test_shared_baked_header_listed_once() {
        let temp = tempdir().unwrap();
        let baked = temp.path().join("shaders.h");
        fs::write(&baked, "").unwrap();
        let files = DiscoveredFiles {
            sources: BTreeSet::from([temp.path().join("main.cpp")]),
            headers: BTreeSet::from([temp.path().join("tools.h")]),
            ..DiscoveredFiles::default()
        };
        let records = [record("a", baked.clone()), record("b", baked.clone())];

        let invocation =
            generate(&Responds(&["clang-format"]), Platform::Posix, &files, &records).unwrap();

        assert!(invocation
            .command
            .starts_with("clang-format -i -Werror --sort-includes "));
        assert_eq!(invocation.command.matches("shaders.h").count(), 1);
        assert!(invocation.command.ends_with("tools.h\""));
    }

    #[test]
    fn test_falls_back_to_exe_name() {
        let invocation = generate(
            &Responds(&["clang-format.exe"]),
            Platform::Posix,
            &DiscoveredFiles::default(),
            &[],
        )
        .unwrap();
        assert!(invocation.command.starts_with("clang-format.exe "));
    }

    #[test]
    fn test_missing_baked_file() {
        let temp = tempdir().unwrap();
        let records = [record("a", temp.path().join("gone.h"))];
        let err = generate(
            &Responds(&["clang-format"]),
            Platform::Posix,
            &DiscoveredFiles::default(),
            &records,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::MissingBakedOutput(_)));
    }
}
