//! Synchronous execution of external commands through the OS shell
//!
//! Commands go through the user's shell rather than being spawned directly so
//! that shell aliases and `&&` chains in generated invocations behave the same
//! as when typed by hand.

use std::process::{Command, Stdio};

use crate::error::{BuildError, BuildResult};

/// Exit code and first line of stdout of a captured command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub first_line: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs command lines through the host shell, blocking until they exit
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: String,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    /// Use `$SHELL` on POSIX (falling back to `sh`), `cmd` on Windows
    pub fn new() -> Self {
        let shell = if cfg!(windows) {
            "cmd".to_string()
        } else {
            std::env::var("SHELL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "sh".to_string())
        };
        Self { shell }
    }

    /// Use an explicit shell executable
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.arg("/C").raw_arg(command_line);
        }
        #[cfg(not(windows))]
        {
            cmd.arg("-c").arg(command_line);
        }
        cmd
    }

    /// Run `command_line`, capturing the first line of stdout and the exit code
    pub fn capture(&self, command_line: &str) -> BuildResult<ProcessOutput> {
        let output = self
            .command(command_line)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| BuildError::io("failed to spawn shell", &self.shell, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().unwrap_or_default().trim_end().to_string();

        Ok(ProcessOutput {
            code: output.status.code(),
            first_line,
        })
    }
}

/// Executes generated command lines to completion
pub trait CommandRunner {
    /// Run `command_line` with inherited stdio; a nonzero exit fails `stage`
    fn run(&self, stage: &'static str, command_line: &str) -> BuildResult<()>;
}

impl CommandRunner for ProcessRunner {
    fn run(&self, stage: &'static str, command_line: &str) -> BuildResult<()> {
        tracing::debug!("{stage}: {command_line}");

        let status = self
            .command(command_line)
            .status()
            .map_err(|e| BuildError::io("failed to spawn shell", &self.shell, e))?;

        if !status.success() {
            return Err(BuildError::CommandFailed {
                stage,
                code: status.code(),
            });
        }

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_capture_first_line_and_code() {
        let runner = ProcessRunner::with_shell("sh");
        let out = runner.capture("printf 'first\\nsecond\\n'").unwrap();
        assert_eq!(out.first_line, "first");
        assert!(out.success());
    }

    #[test]
    fn test_capture_nonzero_exit() {
        let runner = ProcessRunner::with_shell("sh");
        let out = runner.capture("exit 3").unwrap();
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
    }

    #[test]
    fn test_run_reports_failed_stage() {
        let runner = ProcessRunner::with_shell("sh");
        let err = runner.run("shader compilation", "true && false").unwrap_err();
        assert!(matches!(
            err,
            BuildError::CommandFailed {
                stage: "shader compilation",
                code: Some(1)
            }
        ));
    }

    #[test]
    fn test_missing_shell_is_io_error() {
        let runner = ProcessRunner::with_shell("/definitely/not/a/shell");
        assert!(matches!(runner.capture("true"), Err(BuildError::Io { .. })));
    }
}
