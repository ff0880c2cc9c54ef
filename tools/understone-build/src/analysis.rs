//! Line counts and developer tag extraction
//!
//! A tag is written inside a `//` comment as `[ <dev name>::<KIND> ] text`,
//! for example:
//!
//! ```text
//! int x = 1; // [ alice::TODO ] fix this later
//! ```
//!
//! Lines with `//` at column 0 count as comment lines; any other line,
//! including one with a trailing comment, counts as code. Block comments are
//! not recognized.

use std::collections::BTreeMap;
use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, BuildResult};
use crate::scan::DiscoveredFiles;

const COMMENT_TOKEN: &str = "//";
const REPORT_BANNER: &str = "- This is an autogenerated file; content changes will be overwritten -";

/// Closed set of recognized tag kinds, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKind {
    Todo,
    Perf,
    Note,
    Temp,
    Test,
    Study,
    Debug,
    Remove,
    FindMe,
    Revisit,
    Restore,
    StepInto,
    CleanUp,
}

impl TagKind {
    pub const ALL: [TagKind; 13] = [
        TagKind::Todo,
        TagKind::Perf,
        TagKind::Note,
        TagKind::Temp,
        TagKind::Test,
        TagKind::Study,
        TagKind::Debug,
        TagKind::Remove,
        TagKind::FindMe,
        TagKind::Revisit,
        TagKind::Restore,
        TagKind::StepInto,
        TagKind::CleanUp,
    ];

    /// Literal token written after `::` in source
    pub fn token(self) -> &'static str {
        match self {
            TagKind::Todo => "TODO",
            TagKind::Perf => "PERF",
            TagKind::Note => "NOTE",
            TagKind::Temp => "TEMP",
            TagKind::Test => "TEST",
            TagKind::Study => "STUDY",
            TagKind::Debug => "DEBUG",
            TagKind::Remove => "REMOVE",
            TagKind::FindMe => "FINDME",
            TagKind::Revisit => "REVISIT",
            TagKind::Restore => "RESTORE",
            TagKind::StepInto => "STEP_INTO",
            TagKind::CleanUp => "CLEAN_UP",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One tag occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub file: PathBuf,
    /// 1-based
    pub line: usize,
    /// Empty when the tag has no dev name
    pub dev: String,
    pub context: String,
}

/// Tag found in a single comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub kind: TagKind,
    pub dev: String,
    pub context: String,
    /// The bracket around the tag was missing or unbalanced
    pub malformed: bool,
}

/// Which counters a file contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileGroup {
    /// Sources and headers
    Source,
    Shader,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub code: usize,
    pub comment: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Position of `::<token>` in `comment`, not followed by an identifier character
fn find_kind(comment: &str, kind: TagKind) -> Option<usize> {
    let needle = format!("::{}", kind.token());
    comment.match_indices(&needle).map(|(pos, _)| pos).find(|&pos| {
        comment[pos + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c))
    })
}

/// Extract every tag kind present in `comment` (text starting at `//`)
pub fn parse_tags(comment: &str) -> Vec<ParsedTag> {
    let mut tags = Vec::new();
    for kind in TagKind::ALL {
        let Some(pos) = find_kind(comment, kind) else {
            continue;
        };

        let open = comment.find('[').filter(|&open| open < pos);
        let close = comment[pos..].find(']').map(|offset| pos + offset);

        let dev = open
            .map(|open| comment[open + 1..pos].trim_matches(|c| c == ' ' || c == '[').to_string())
            .unwrap_or_default();

        let without_tag = match (open, close) {
            (Some(open), Some(close)) => format!("{}{}", &comment[..open], &comment[close + 1..]),
            (Some(open), None) => comment[..open].to_string(),
            (None, _) => comment.to_string(),
        };
        let context = without_tag
            .trim_start_matches(|c| c == '/' || c == ' ')
            .trim_end()
            .to_string();

        tags.push(ParsedTag {
            kind,
            dev,
            context,
            malformed: open.is_none() || close.is_none(),
        });
    }
    tags
}

/// Accumulated counts and tags over a set of files
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub source: LineCounts,
    pub shader: LineCounts,
    pub tags: BTreeMap<TagKind, Vec<TagEntry>>,
}

impl Analysis {
    /// Analyze every discovered source, header and shader
    pub fn run(files: &DiscoveredFiles) -> BuildResult<Self> {
        let mut analysis = Self::default();
        for path in files.sources.iter().chain(&files.headers) {
            analysis.analyze_file(path, FileGroup::Source)?;
        }
        for path in &files.shaders {
            analysis.analyze_file(path, FileGroup::Shader)?;
        }
        Ok(analysis)
    }

    pub fn analyze_file(&mut self, path: &Path, group: FileGroup) -> BuildResult<()> {
        let bytes = fs::read(path).map_err(|e| BuildError::io("failed to read", path, e))?;
        self.analyze_text(path, &String::from_utf8_lossy(&bytes), group);
        Ok(())
    }

    /// Count and tag-scan `text`; `path` is recorded in the entries
    pub fn analyze_text(&mut self, path: &Path, text: &str, group: FileGroup) {
        let counts = match group {
            FileGroup::Source => &mut self.source,
            FileGroup::Shader => &mut self.shader,
        };

        for (index, line) in text.lines().enumerate() {
            let Some(comment_start) = line.find(COMMENT_TOKEN) else {
                counts.code += 1;
                continue;
            };
            if comment_start == 0 {
                counts.comment += 1;
            } else {
                counts.code += 1;
            }

            for tag in parse_tags(&line[comment_start..]) {
                if tag.malformed {
                    tracing::warn!(
                        "Tag parser (likely) found a malformed tag in {} on line {}: {}",
                        path.display(),
                        index + 1,
                        line
                    );
                }
                self.tags.entry(tag.kind).or_default().push(TagEntry {
                    file: path.to_path_buf(),
                    line: index + 1,
                    dev: tag.dev,
                    context: tag.context,
                });
            }
        }
    }

    pub fn tag_count(&self) -> usize {
        self.tags.values().map(Vec::len).sum()
    }

    /// Text of the analysis report
    pub fn render_report(&self) -> BuildResult<String> {
        let decorator = "-".repeat(REPORT_BANNER.len());
        let mut out = String::new();
        writeln!(out, "{decorator}\n{REPORT_BANNER}\n{decorator}\n")?;

        writeln!(out, "Source LOC:         {}", self.source.code)?;
        writeln!(out, "Source Comment LOC: {}", self.source.comment)?;
        writeln!(out, "Shader LOC:         {}", self.shader.code)?;
        writeln!(out, "Shader Comment LOC: {}", self.shader.comment)?;
        writeln!(out)?;

        for (kind, entries) in &self.tags {
            writeln!(out, "{} {kind} tags:", entries.len())?;
            for entry in entries {
                let file_name = entry
                    .file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "   [{}] ({file_name}, {}): {}",
                    entry.dev, entry.line, entry.context
                )?;
            }
            writeln!(out)?;
        }
        Ok(out)
    }

    /// Write the report to `path`, creating its directory if needed
    pub fn write_report(&self, path: &Path) -> BuildResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| BuildError::io("failed to create", dir, e))?;
        }
        let report = self.render_report()?;
        fs::write(path, report).map_err(|e| BuildError::io("failed to write", path, e))?;
        tracing::info!(
            "Wrote analysis report with {} tag(s) to {}",
            self.tag_count(),
            path.display()
        );
        Ok(())
    }
}
