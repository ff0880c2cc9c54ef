//! Stage sequencing for one build
//!
//! ```text
//! RootLocate -> Scan -> ParseArgs -> ShaderInvoke -> ShaderCompileExec -> Bake
//!   -> SourceInvoke -> SourceCompileExec -> [Format] -> [Analyze] -> [RunAfterBuild]
//! ```
//!
//! Stages run strictly in order and the first error ends the build. The
//! bracketed stages are skipped when disabled in the configuration.

use std::fmt;
use std::path::Path;

use crate::analysis::Analysis;
use crate::bake;
use crate::cli::Cli;
use crate::config::{BuildFlag, ConfigFile, UserConfiguration};
use crate::error::{BuildError, BuildResult};
use crate::invocation::{format, sdk, shader, source};
use crate::platform::{quoted, Platform};
use crate::process::CommandRunner;
use crate::root::{self, ProjectLayout};
use crate::scan::{self, ScanResult};
use crate::toolchain::ToolProbe;

pub const RUN_STAGE: &str = "engine run";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RootLocate,
    Scan,
    ParseArgs,
    ShaderInvoke,
    ShaderCompileExec,
    Bake,
    SourceInvoke,
    SourceCompileExec,
    Format,
    Analyze,
    RunAfterBuild,
}

impl Stage {
    /// Progress line logged when the stage starts
    pub fn description(self) -> &'static str {
        match self {
            Stage::RootLocate => "Locating project root...",
            Stage::Scan => "Scanning dependencies...",
            Stage::ParseArgs => "Resolving configuration...",
            Stage::ShaderInvoke => "Generating shader invocation...",
            Stage::ShaderCompileExec => "Compiling shaders...",
            Stage::Bake => "Baking shaders...",
            Stage::SourceInvoke => "Generating source invocation...",
            Stage::SourceCompileExec => "Compiling source files...",
            Stage::Format => "Formatting source files...",
            Stage::Analyze => "Running code analysis...",
            Stage::RunAfterBuild => "Launching Understone...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn enter(stage: Stage) {
    tracing::info!("{}", stage.description());
}

/// Resolve the layered configuration for the project at `layout`
pub fn resolve_configuration(layout: &ProjectLayout, cli: &Cli) -> BuildResult<UserConfiguration> {
    let mut config = UserConfiguration::default();
    if let Some(file) = ConfigFile::load(layout.root())? {
        tracing::debug!("Applying {}", ConfigFile::path(layout.root()).display());
        file.apply(layout.root(), &mut config)?;
    }
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Everything one build run needs from its environment
pub struct Pipeline<'a> {
    pub platform: Platform,
    pub probe: &'a dyn ToolProbe,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(platform: Platform, probe: &'a dyn ToolProbe, runner: &'a dyn CommandRunner) -> Self {
        Self {
            platform,
            probe,
            runner,
        }
    }

    /// Run every stage for the project found above `start`
    pub fn run(&self, cli: &Cli, start: &Path) -> BuildResult<()> {
        enter(Stage::RootLocate);
        let root = root::locate_root(start, root::ENTRY_POINT).ok_or_else(|| BuildError::RootNotFound {
            start: start.to_path_buf(),
        })?;
        tracing::info!("Project root: {}", root.display());
        let layout = ProjectLayout::new(root);

        enter(Stage::Scan);
        let ScanResult {
            mut files,
            shaders: mut records,
        } = scan::scan_dependencies(layout.root())?;

        enter(Stage::ParseArgs);
        let config = resolve_configuration(&layout, cli)?;
        tracing::info!(
            "Configuration: {} / {}",
            config.compiler.name(),
            config.profile_label()
        );

        enter(Stage::ShaderInvoke);
        let shader_invocation = shader::generate(
            self.probe,
            self.platform,
            &layout,
            &config,
            &files.shaders,
            &mut records,
        )?;

        enter(Stage::ShaderCompileExec);
        shader_invocation.execute(self.runner)?;

        enter(Stage::Bake);
        bake::bake_shaders(&layout, &config, &mut records, &mut files.headers)?;

        enter(Stage::SourceInvoke);
        let vulkan_sdk = sdk::discover(&config, self.platform)?;
        let source_invocation = source::generate(
            self.probe,
            self.platform,
            &layout,
            &config,
            &files,
            &records,
            &vulkan_sdk,
        )?;

        enter(Stage::SourceCompileExec);
        source_invocation.execute(self.runner)?;

        if config.flag(BuildFlag::RunCodeFormatter) {
            enter(Stage::Format);
            format::generate(self.probe, self.platform, &files, &records)?.execute(self.runner)?;
        }

        if config.flag(BuildFlag::RunCodeAnalysis) {
            enter(Stage::Analyze);
            Analysis::run(&files)?.write_report(&layout.analysis_report())?;
        }

        if config.flag(BuildFlag::RunAfterBuild) {
            enter(Stage::RunAfterBuild);
            self.launch(&layout, &config)?;
        }

        Ok(())
    }

    fn launch(&self, layout: &ProjectLayout, config: &UserConfiguration) -> BuildResult<()> {
        let executable = layout.engine_executable(self.platform);
        if !config.run_args.is_empty() {
            tracing::info!("Launch arguments: {}", config.run_args);
        }
        let command = format!("{} {}", quoted(&executable), config.run_args);
        self.runner.run(RUN_STAGE, command.trim_end())
    }
}
