//! Command line surface of `build_understone`
//!
//! The tool has always been driven with single-dash long flags (`-debug`,
//! `-clang-cl`, `-vulkan_sdk <path>`), matched case-insensitively.
//! [`normalize_args`] rewrites those into clap's `--long` form before parsing,
//! so both spellings work.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};

use crate::config::{rewrite_run_args, BuildFlag, CompilerBackend, Profile, UserConfiguration};

/// Flags whose following argument is a value and must not be rewritten
const VALUE_FLAGS: [&str; 2] = ["--vulkan_sdk", "--run_after_build_args"];

/// Build tool for the Understone engine
#[derive(Debug, Default, Parser)]
#[command(name = "build_understone")]
#[command(about = "Build tool for the Understone engine")]
#[command(args_override_self = true)]
pub struct Cli {
    /// Compile using clang-cl
    #[arg(long = "clang-cl", overrides_with = "clang")]
    pub clang_cl: bool,

    /// Compile using clang
    #[arg(long = "clang", overrides_with = "clang_cl")]
    pub clang: bool,

    /// Compile using debug settings
    #[arg(long, overrides_with = "release")]
    pub debug: bool,

    /// Compile using release settings
    #[arg(long, overrides_with = "debug")]
    pub release: bool,

    /// Full path to your Vulkan SDK install
    #[arg(
        long = "vulkan_sdk",
        value_name = "PATH",
        allow_hyphen_values = true,
        value_parser = parse_sdk_path
    )]
    pub vulkan_sdk: Option<PathBuf>,

    /// Do not run clang-format on source & header files
    #[arg(long = "no_code_format")]
    pub no_code_format: bool,

    /// Do not run code analysis after a successful build
    #[arg(long = "no_code_analysis")]
    pub no_code_analysis: bool,

    /// Run Understone after a successful build
    #[arg(long = "run_after_build")]
    pub run_after_build: bool,

    /// Comma separated (no spaces) arguments to pass to Understone when running post-build
    #[arg(long = "run_after_build_args", value_name = "ARGS", allow_hyphen_values = true)]
    pub run_after_build_args: Option<String>,
}

/// Text printed for a rejected command line: the error, then the full help
pub fn usage_report(err: &clap::Error) -> String {
    format!("{}\n{}", err.render(), Cli::command().render_help())
}

fn parse_sdk_path(value: &str) -> Result<PathBuf, String> {
    if value.starts_with('-') {
        return Err(format!("expects a path, got: {value}"));
    }
    if !Path::new(value).exists() {
        return Err(format!("provided path does not exist: {value}"));
    }
    Ok(PathBuf::from(value))
}

/// Rewrite legacy `-flag` spellings into lowercase `--flag`
///
/// The program name and the values of value-taking flags pass through
/// untouched. Single-character short flags such as `-h` are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut expect_value = false;

    for (index, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if index == 0 || expect_value {
            expect_value = false;
            normalized.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };

        let long = if let Some(rest) = text.strip_prefix("--") {
            Some(rest)
        } else {
            text.strip_prefix('-').filter(|rest| rest.len() > 1)
        };

        match long {
            Some(rest) => {
                let (name, value) = match rest.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (rest, None),
                };
                let flag = format!("--{}", name.to_lowercase());
                expect_value = value.is_none() && VALUE_FLAGS.contains(&flag.as_str());
                match value {
                    Some(value) => normalized.push(format!("{flag}={value}").into()),
                    None => normalized.push(flag.into()),
                }
            }
            None => normalized.push(arg),
        }
    }

    normalized
}

impl Cli {
    /// Parse `args` (program name first), accepting the legacy spellings
    pub fn try_parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Layer the command line over `config`
    pub fn apply(&self, config: &mut UserConfiguration) {
        if self.clang_cl {
            config.compiler = CompilerBackend::ClangCl;
        } else if self.clang {
            config.compiler = CompilerBackend::Clang;
        }

        if self.debug {
            config.set_profile(Profile::Debug);
        } else if self.release {
            config.set_profile(Profile::Release);
        }

        if let Some(sdk) = &self.vulkan_sdk {
            config.set_vulkan_sdk(sdk);
        }

        if self.no_code_format {
            config.set_flag(BuildFlag::RunCodeFormatter, false);
        }
        if self.no_code_analysis {
            config.set_flag(BuildFlag::RunCodeAnalysis, false);
        }
        if self.run_after_build {
            config.set_flag(BuildFlag::RunAfterBuild, true);
        }
        if let Some(args) = &self.run_after_build_args {
            config.run_args = rewrite_run_args(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut full = vec!["build_understone"];
        full.extend_from_slice(args);
        Cli::try_parse_from(normalize_args(full))
    }

    fn configured(args: &[&str]) -> UserConfiguration {
        let mut config = UserConfiguration::default();
        parse(args).unwrap().apply(&mut config);
        config
    }

    #[test]
    fn test_normalize_legacy_flags() {
        let args = normalize_args(["prog", "-Debug", "-run_after_build_args", "-Fullscreen,-X", "-h"]);
        assert_eq!(
            args,
            vec!["prog", "--debug", "--run_after_build_args", "-Fullscreen,-X", "-h"]
        );
    }

    #[test]
    fn test_normalize_keeps_inline_value_case() {
        let args = normalize_args(["prog", "-VULKAN_SDK=/Opt/SDK"]);
        assert_eq!(args, vec!["prog", "--vulkan_sdk=/Opt/SDK"]);
    }

    #[test]
    fn test_profile_is_exclusive_and_last_wins() {
        let cases: [(&[&str], bool); 6] = [
            (&[], true),
            (&["-release"], false),
            (&["-debug", "-release"], false),
            (&["-release", "-debug"], true),
            (&["-release", "-release", "-debug", "-release"], false),
            (&["-debug", "-debug"], true),
        ];
        for (args, debug) in cases {
            let config = configured(args);
            assert_eq!(config.is_debug(), debug, "{args:?}");
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_compiler_last_wins() {
        assert_eq!(configured(&["-clang-cl"]).compiler, CompilerBackend::ClangCl);
        assert_eq!(configured(&["-clang-cl", "-clang"]).compiler, CompilerBackend::Clang);
        assert_eq!(configured(&["-clang", "-CLANG-CL"]).compiler, CompilerBackend::ClangCl);
    }

    #[test]
    fn test_build_flags() {
        let config = configured(&["-no_code_format", "-no_code_analysis", "-run_after_build"]);
        assert!(!config.flag(BuildFlag::RunCodeFormatter));
        assert!(!config.flag(BuildFlag::RunCodeAnalysis));
        assert!(config.flag(BuildFlag::RunAfterBuild));
    }

    #[test]
    fn test_run_args_rewritten() {
        let config = configured(&["-run_after_build_args", "a,b,c"]);
        assert_eq!(config.run_args, "a b c");
    }

    #[test]
    fn test_vulkan_sdk_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        let sdk = temp.path().to_str().unwrap();
        let config = configured(&["-vulkan_sdk", sdk]);
        assert_eq!(config.vulkan_sdk(), Some(sdk));

        assert!(parse(&["-vulkan_sdk", "/definitely/not/a/vulkan/sdk"]).is_err());
        assert!(parse(&["-vulkan_sdk", "-debug"]).is_err());
        assert!(parse(&["-vulkan_sdk"]).is_err());
    }

    #[test]
    fn test_unknown_argument_is_fatal() {
        let err = parse(&["-optimize"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_rejected_arguments_print_every_option() {
        let err = Cli::try_parse_normalized(["build_understone", "-optimize"]).unwrap_err();
        assert_ne!(err.exit_code(), 0);

        let report = usage_report(&err).to_string();
        assert!(report.contains("--optimize"), "{report}");
        for option in [
            "--clang-cl",
            "--debug",
            "--release",
            "--vulkan_sdk",
            "--no_code_format",
            "--no_code_analysis",
            "--run_after_build",
            "--run_after_build_args",
        ] {
            assert!(report.contains(option), "missing {option} in:\n{report}");
        }
    }

    #[test]
    fn test_help_is_not_an_error_exit() {
        let err = parse(&["-help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }
}
