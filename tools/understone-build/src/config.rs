//! User configuration
//!
//! Resolved in three layers, each overriding the previous one:
//! built-in defaults, the optional `build/understone.toml` project file, and
//! the command line. The result is a [`UserConfiguration`] whose flag and
//! option maps must always hold exactly their fixed key sets.
//!
//! # Project file (build/understone.toml)
//!
//! ```toml
//! compiler = "clang"            # or "clang-cl"
//! profile = "release"           # or "debug"
//! vulkan_sdk = "/opt/vulkan/1.3.280.0"
//! sdk_search_root = "/opt/vulkan"
//! format = true
//! analyze = false
//! run_after_build = true
//! run_args = ["-fullscreen", "-vsync"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BuildError, BuildResult};

/// Name of the optional project configuration file inside `<root>/build`
pub const CONFIG_FILE_NAME: &str = "understone.toml";

/// C/C++ compiler driver used for the engine sources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerBackend {
    #[default]
    Clang,
    ClangCl,
}

impl CompilerBackend {
    pub fn name(self) -> &'static str {
        match self {
            CompilerBackend::Clang => "clang",
            CompilerBackend::ClangCl => "clang-cl",
        }
    }
}

/// Shader compiler used to produce SPIR-V
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShaderCompilerBackend {
    #[default]
    Glslc,
}

/// Build profile as written in the project file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Debug,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompilationFlag {
    Debug,
    Release,
}

impl CompilationFlag {
    pub const ALL: [CompilationFlag; 2] = [CompilationFlag::Debug, CompilationFlag::Release];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompilationOption {
    /// Vulkan SDK install path; empty means auto-discover
    VulkanSdkPath,
}

impl CompilationOption {
    pub const ALL: [CompilationOption; 1] = [CompilationOption::VulkanSdkPath];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildFlag {
    RunCodeFormatter,
    RunCodeAnalysis,
    RunAfterBuild,
}

impl BuildFlag {
    pub const ALL: [BuildFlag; 3] = [
        BuildFlag::RunCodeFormatter,
        BuildFlag::RunCodeAnalysis,
        BuildFlag::RunAfterBuild,
    ];
}

/// Everything the user can configure for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserConfiguration {
    pub compiler: CompilerBackend,
    pub shader_compiler: ShaderCompilerBackend,
    pub compilation_flags: BTreeMap<CompilationFlag, bool>,
    pub compilation_options: BTreeMap<CompilationOption, String>,
    pub build_flags: BTreeMap<BuildFlag, bool>,
    /// Space separated arguments for the launched binary
    pub run_args: String,
    /// Overrides the fixed Vulkan SDK install root scanned during discovery
    pub sdk_search_root: Option<PathBuf>,
}

impl Default for UserConfiguration {
    fn default() -> Self {
        Self {
            compiler: CompilerBackend::default(),
            shader_compiler: ShaderCompilerBackend::default(),
            compilation_flags: BTreeMap::from([
                (CompilationFlag::Debug, true),
                (CompilationFlag::Release, false),
            ]),
            compilation_options: BTreeMap::from([(CompilationOption::VulkanSdkPath, String::new())]),
            build_flags: BTreeMap::from([
                (BuildFlag::RunCodeFormatter, true),
                (BuildFlag::RunCodeAnalysis, true),
                (BuildFlag::RunAfterBuild, false),
            ]),
            run_args: String::new(),
            sdk_search_root: None,
        }
    }
}

impl UserConfiguration {
    /// Select a profile; debug and release are always set together
    pub fn set_profile(&mut self, profile: Profile) {
        let debug = profile == Profile::Debug;
        self.compilation_flags.insert(CompilationFlag::Debug, debug);
        self.compilation_flags.insert(CompilationFlag::Release, !debug);
    }

    pub fn is_debug(&self) -> bool {
        self.compilation_flags
            .get(&CompilationFlag::Debug)
            .copied()
            .unwrap_or(false)
    }

    /// "DEBUG" or "RELEASE", as stamped into generated files
    pub fn profile_label(&self) -> &'static str {
        if self.is_debug() {
            "DEBUG"
        } else {
            "RELEASE"
        }
    }

    pub fn flag(&self, flag: BuildFlag) -> bool {
        self.build_flags.get(&flag).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, flag: BuildFlag, value: bool) {
        self.build_flags.insert(flag, value);
    }

    /// Explicit SDK path, if one was configured
    pub fn vulkan_sdk(&self) -> Option<&str> {
        self.compilation_options
            .get(&CompilationOption::VulkanSdkPath)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    pub fn set_vulkan_sdk(&mut self, path: &Path) {
        self.compilation_options.insert(
            CompilationOption::VulkanSdkPath,
            path.to_string_lossy().into_owned(),
        );
    }

    /// Check the map key sets and the debug/release pairing
    pub fn validate(&self) -> BuildResult<()> {
        let mut problems = Vec::new();

        if !self.compilation_flags.keys().copied().eq(CompilationFlag::ALL) {
            problems.push(format!(
                "compilation flags must be exactly {:?}, found {:?}",
                CompilationFlag::ALL,
                self.compilation_flags.keys().collect::<Vec<_>>()
            ));
        }
        if !self.compilation_options.keys().copied().eq(CompilationOption::ALL) {
            problems.push(format!(
                "compilation options must be exactly {:?}, found {:?}",
                CompilationOption::ALL,
                self.compilation_options.keys().collect::<Vec<_>>()
            ));
        }
        if !self.build_flags.keys().copied().eq(BuildFlag::ALL) {
            problems.push(format!(
                "build flags must be exactly {:?}, found {:?}",
                BuildFlag::ALL,
                self.build_flags.keys().collect::<Vec<_>>()
            ));
        }

        let debug = self.compilation_flags.get(&CompilationFlag::Debug);
        let release = self.compilation_flags.get(&CompilationFlag::Release);
        if let (Some(debug), Some(release)) = (debug, release) {
            if debug == release {
                problems.push(format!(
                    "exactly one of debug and release must be set (debug: {debug}, release: {release})"
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(BuildError::Validation(problems.join("\n")))
        }
    }
}

/// Turn `a,b,c` into `a b c`; empty segments are dropped
pub fn rewrite_run_args(raw: &str) -> String {
    raw.split(',')
        .filter(|arg| !arg.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Contents of `build/understone.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub compiler: Option<CompilerBackend>,
    pub profile: Option<Profile>,
    pub vulkan_sdk: Option<PathBuf>,
    pub sdk_search_root: Option<PathBuf>,
    pub format: Option<bool>,
    pub analyze: Option<bool>,
    pub run_after_build: Option<bool>,
    pub run_args: Option<Vec<String>>,
}

impl ConfigFile {
    /// Path of the project file under `root`
    pub fn path(root: &Path) -> PathBuf {
        root.join("build").join(CONFIG_FILE_NAME)
    }

    /// Load the project file under `root`; `None` when there is none
    pub fn load(root: &Path) -> BuildResult<Option<Self>> {
        let path = Self::path(root);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BuildError::io("failed to read", &path, e))?;
        Self::parse(&path, &content).map(Some)
    }

    /// Parse file contents; `path` is used for diagnostics
    pub fn parse(path: &Path, content: &str) -> BuildResult<Self> {
        toml::from_str(content).map_err(|source| BuildError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layer these values over `config`; relative paths resolve against `root`
    pub fn apply(&self, root: &Path, config: &mut UserConfiguration) -> BuildResult<()> {
        if let Some(compiler) = self.compiler {
            config.compiler = compiler;
        }
        if let Some(profile) = self.profile {
            config.set_profile(profile);
        }
        if let Some(sdk) = &self.vulkan_sdk {
            let sdk = root.join(sdk);
            if !sdk.exists() {
                return Err(BuildError::InvalidConfiguration(format!(
                    "vulkan_sdk in {CONFIG_FILE_NAME} does not exist: {}",
                    sdk.display()
                )));
            }
            config.set_vulkan_sdk(&sdk);
        }
        if let Some(search_root) = &self.sdk_search_root {
            config.sdk_search_root = Some(root.join(search_root));
        }
        if let Some(format) = self.format {
            config.set_flag(BuildFlag::RunCodeFormatter, format);
        }
        if let Some(analyze) = self.analyze {
            config.set_flag(BuildFlag::RunCodeAnalysis, analyze);
        }
        if let Some(run) = self.run_after_build {
            config.set_flag(BuildFlag::RunAfterBuild, run);
        }
        if let Some(args) = &self.run_args {
            config.run_args = args.join(" ");
        }
        Ok(())
    }
}
