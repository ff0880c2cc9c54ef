//! Shader records and the metadata header embedded in shader sources
//!
//! Every shader carries three comment lines, in any order, anywhere before
//! the point where all three have been seen:
//!
//! ```text
//! // @uAutoGenFileName: shaders.h
//! // @uCommonName: basic_vert
//! // @uShaderType: VERTEX
//! ```
//!
//! The value is whatever follows the marker and its `:` separator, trimmed.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

use crate::error::{BuildError, BuildResult};

pub const COMMON_NAME_MARKER: &str = "@uCommonName";
pub const SHADER_TYPE_MARKER: &str = "@uShaderType";
pub const GENERATED_FILE_MARKER: &str = "@uAutoGenFileName";

/// Header layout quoted in diagnostics when a shader is missing its metadata
pub const HEADER_TEMPLATE: &str = "\t// @uAutoGenFileName: <name for auto generation>.h\n\
                                   \t// @uCommonName: <unique name>\n\
                                   \t// @uShaderType: VERTEX | FRAGMENT";

/// Extensions a generated file name may end with
pub const HEADER_EXTENSIONS: [&str; 2] = [".h", ".hpp"];

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Parse the literal stage token used in shader headers
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "VERTEX" => Some(ShaderStage::Vertex),
            "FRAGMENT" => Some(ShaderStage::Fragment),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::Fragment => "FRAGMENT",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The three metadata fields of a shader source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderHeader {
    pub common_name: String,
    pub stage: ShaderStage,
    pub generated_file_name: String,
}

/// One discovered shader and the artifacts produced for it during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderRecord {
    pub source: PathBuf,
    pub stage: ShaderStage,
    /// Unique across the run; used as the generated C identifier
    pub common_name: String,
    /// Header the shader is baked into; several shaders may share one
    pub generated_file_name: String,
    /// Set by the shader compilation stage
    pub binary_path: Option<PathBuf>,
    /// Set by the bake stage
    pub output_path: Option<PathBuf>,
}

impl ShaderRecord {
    pub fn new(source: PathBuf, header: ShaderHeader) -> Self {
        Self {
            source,
            stage: header.stage,
            common_name: header.common_name,
            generated_file_name: header.generated_file_name,
            binary_path: None,
            output_path: None,
        }
    }
}

/// Value following `marker` on `line`, if the marker is present
fn marker_value<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let start = line.find(marker)? + marker.len();
    let rest = &line[start..];
    Some(rest.strip_prefix(':').unwrap_or(rest).trim())
}

/// A bare file name with a header extension, no directories or `..`
pub fn is_header_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    plain && HEADER_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Common names become C identifiers in the baked header
pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// Read the metadata header from the shader file at `path`
pub fn read_header(path: &Path) -> BuildResult<ShaderHeader> {
    let file = File::open(path).map_err(|e| BuildError::io("failed to open shader", path, e))?;
    parse_header(path, BufReader::new(file))
}

/// Parse the metadata header from `reader`; `path` is used for diagnostics
///
/// Reading stops as soon as all three markers have been seen. The first
/// occurrence of each marker wins.
pub fn parse_header(path: &Path, reader: impl BufRead) -> BuildResult<ShaderHeader> {
    let mut common_name: Option<String> = None;
    let mut stage: Option<ShaderStage> = None;
    let mut generated_file_name: Option<String> = None;

    for line in reader.lines() {
        if common_name.is_some() && stage.is_some() && generated_file_name.is_some() {
            break;
        }
        let line = line.map_err(|e| BuildError::io("failed to read shader", path, e))?;

        if common_name.is_none() {
            if let Some(value) = marker_value(&line, COMMON_NAME_MARKER) {
                if !is_c_identifier(value) {
                    return Err(BuildError::InvalidCommonName {
                        path: path.to_path_buf(),
                        value: value.to_string(),
                    });
                }
                common_name = Some(value.to_string());
            }
        }

        if stage.is_none() {
            if let Some(value) = marker_value(&line, SHADER_TYPE_MARKER) {
                let parsed = ShaderStage::from_token(value).ok_or_else(|| {
                    BuildError::InvalidShaderStage {
                        path: path.to_path_buf(),
                        value: value.to_string(),
                    }
                })?;
                stage = Some(parsed);
            }
        }

        if generated_file_name.is_none() {
            if let Some(value) = marker_value(&line, GENERATED_FILE_MARKER) {
                if !is_header_file_name(value) {
                    return Err(BuildError::InvalidGeneratedFileName {
                        path: path.to_path_buf(),
                        value: value.to_string(),
                    });
                }
                generated_file_name = Some(value.to_string());
            }
        }
    }

    match (common_name, stage, generated_file_name) {
        (Some(common_name), Some(stage), Some(generated_file_name)) => Ok(ShaderHeader {
            common_name,
            stage,
            generated_file_name,
        }),
        _ => Err(BuildError::MissingShaderHeader {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> BuildResult<ShaderHeader> {
        parse_header(Path::new("test.vert"), source.as_bytes())
    }

    #[test]
    fn test_parse_complete_header() {
        let header = parse(
            "// @uAutoGenFileName: shaders.h\n\
             // @uCommonName: basic_vert\n\
             // @uShaderType: VERTEX\n\
             #version 450\n",
        )
        .unwrap();

        assert_eq!(header.common_name, "basic_vert");
        assert_eq!(header.stage, ShaderStage::Vertex);
        assert_eq!(header.generated_file_name, "shaders.h");
    }

    #[test]
    fn test_marker_order_is_irrelevant() {
        let lines = [
            "// @uAutoGenFileName: shaders.hpp",
            "// @uCommonName: tonemap",
            "// @uShaderType: FRAGMENT",
        ];
        let expected = parse(&lines.join("\n")).unwrap();

        let permutations = [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in permutations {
            let source = order.map(|i| lines[i]).join("\n");
            assert_eq!(parse(&source).unwrap(), expected, "order {order:?}");
        }
    }

    #[test]
    fn test_values_are_trimmed() {
        let header = parse(
            "//   @uCommonName:    spaced_out   \r\n\
             // @uShaderType:FRAGMENT\n\
             // @uAutoGenFileName:\tbaked.h  \n",
        )
        .unwrap();
        assert_eq!(header.common_name, "spaced_out");
        assert_eq!(header.stage, ShaderStage::Fragment);
        assert_eq!(header.generated_file_name, "baked.h");
    }

    #[test]
    fn test_invalid_stage() {
        let err = parse(
            "// @uCommonName: a\n// @uShaderType: GEOMETRY\n// @uAutoGenFileName: a.h\n",
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::InvalidShaderStage { ref value, .. } if value == "GEOMETRY"));
    }

    #[test]
    fn test_stage_is_case_sensitive() {
        let err = parse(
            "// @uCommonName: a\n// @uShaderType: vertex\n// @uAutoGenFileName: a.h\n",
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::InvalidShaderStage { .. }));
    }

    #[test]
    fn test_generated_name_must_be_header() {
        for bad in ["shaders.c", "shaders.h.txt", "", "baked/shaders.h", "./shaders.h"] {
            let source = format!(
                "// @uCommonName: a\n// @uShaderType: VERTEX\n// @uAutoGenFileName: {bad}\n"
            );
            let err = parse(&source).unwrap_err();
            assert!(
                matches!(err, BuildError::InvalidGeneratedFileName { .. }),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_generated_name_cannot_be_a_path() {
        for bad in ["/tmp/outside_victim.h", "../outside_victim.h", "../../source/Understone.hpp"] {
            let source = format!(
                "// @uCommonName: a\n// @uShaderType: VERTEX\n// @uAutoGenFileName: {bad}\n"
            );
            let err = parse(&source).unwrap_err();
            assert!(
                matches!(err, BuildError::InvalidGeneratedFileName { ref value, .. } if value == bad),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_bare_extension_is_a_header_name() {
        let header = parse("// @uCommonName: a\n// @uShaderType: VERTEX\n// @uAutoGenFileName: .h\n").unwrap();
        assert_eq!(header.generated_file_name, ".h");
    }

    #[test]
    fn test_common_name_must_be_identifier() {
        for bad in ["my shader", "", "2d_blit", "blit-pass"] {
            let source = format!(
                "// @uCommonName: {bad}\n// @uShaderType: VERTEX\n// @uAutoGenFileName: a.h\n"
            );
            let err = parse(&source).unwrap_err();
            assert!(matches!(err, BuildError::InvalidCommonName { .. }), "accepted {bad:?}");
            assert_eq!(err.kind(), crate::error::ErrorKind::Metadata);
        }
        assert!(is_c_identifier("_blit2d"));
    }

    #[test]
    fn test_missing_marker_reports_template() {
        let err = parse("// @uCommonName: a\n// @uShaderType: VERTEX\nvoid main() {}\n").unwrap_err();
        assert!(matches!(err, BuildError::MissingShaderHeader { .. }));
        assert!(err.to_string().contains(GENERATED_FILE_MARKER));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let header = parse(
            "// @uCommonName: first\n\
             // @uShaderType: VERTEX\n\
             // @uCommonName: second\n\
             // @uAutoGenFileName: a.h\n",
        )
        .unwrap();
        assert_eq!(header.common_name, "first");
    }
}
