//! build_understone - build driver for the Understone engine
//!
//! # Usage
//!
//! Run from anywhere inside (or next to) an Understone checkout:
//! ```bash
//! build_understone -release -no_code_format
//! build_understone -run_after_build -run_after_build_args fullscreen,vsync
//! ```
//!
//! Defaults can be set per project in `build/understone.toml`; command line
//! flags override them.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use understone_build::cli::{usage_report, Cli};
use understone_build::platform::Platform;
use understone_build::process::ProcessRunner;
use understone_build::{BuildError, Pipeline};

fn init_logging() {
    // Warnings and errors go to stderr, everything else to stdout
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(writer)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let start = std::env::current_dir().context("Failed to read the current directory")?;
    let runner = ProcessRunner::new();
    tracing::debug!("Using shell '{}'", runner.shell());

    Pipeline::new(Platform::host(), &runner, &runner).run(cli, &start)?;
    Ok(())
}

fn main() -> ExitCode {
    // Help and argument errors exit here, before any logging is set up
    let cli = match Cli::try_parse_normalized(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) if err.exit_code() == 0 => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", usage_report(&err));
            return ExitCode::FAILURE;
        }
    };
    init_logging();

    match run(&cli) {
        Ok(()) => {
            tracing::info!("[ success ]");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let label = err
                .downcast_ref::<BuildError>()
                .map(|e| e.kind().label())
                .unwrap_or("error");
            tracing::error!("[{label}] {err:#}");
            ExitCode::FAILURE
        }
    }
}
