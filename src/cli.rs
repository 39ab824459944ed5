//! Command-line interface for connect-instrument.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::error::GenerateError;
use crate::generate::SynthesisOptions;
use crate::runner::{BatchSummary, Runner, STDIN_LABEL};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Generate OpenTelemetry decorators for connect-go clients.
///
/// With no directories, reads one generated `*.connect.go` unit from stdin
/// and writes the instrumented wrapper to stdout. With directories, writes
/// an `api.telemetry.go` next to every `api.connect.go` found beneath them.
#[derive(Parser, Debug)]
#[command(name = "connect-instrument")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to walk (default: read stdin, write stdout)
    pub dirs: Vec<PathBuf>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Emit tracer provider init and shutdown scaffolding
    #[arg(long)]
    pub lifecycle: bool,

    /// Emit a switch that turns span creation off at runtime
    #[arg(long)]
    pub runtime_toggle: bool,

    /// Pass the tracer into each decorator instead of using package globals
    #[arg(long)]
    pub injectable_tracer: bool,

    /// Output format for stdin mode
    #[arg(short, long, value_enum, default_value_t = Format::Go)]
    pub format: Format,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// What stdin mode prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// The generated Go source
    Go,
    /// The extracted service descriptors as JSON
    Json,
}

impl Cli {
    /// Generator flags requested on the command line.
    fn synthesis_flags(&self) -> SynthesisOptions {
        SynthesisOptions {
            include_provider_lifecycle: self.lifecycle,
            runtime_toggle: self.runtime_toggle,
            tracer_as_injectable_capability: self.injectable_tracer,
        }
    }
}

/// Run the generator and return the process exit code.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if cli.format == Format::Json && !cli.dirs.is_empty() {
        eprintln!("Error: --format json only applies when reading from stdin");
        return Ok(EXIT_ERROR);
    }

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let mut config = match Config::load(cli.config.as_deref(), &cwd) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };
    config.enable(cli.synthesis_flags());

    let runner = Runner::new(config);

    let result = if cli.dirs.is_empty() {
        run_stdin(&runner, cli.format)
    } else {
        run_dirs(&runner, &cli.dirs)
    };

    match result {
        Ok(()) => Ok(EXIT_SUCCESS),
        Err(e) if e.downcast_ref::<GenerateError>().is_some() => {
            eprintln!("Error: {:#}", e);
            Ok(EXIT_FAILED)
        }
        Err(e) => Err(e),
    }
}

/// Read one unit from stdin and print the result to stdout.
fn run_stdin(runner: &Runner, format: Format) -> anyhow::Result<()> {
    let mut source = Vec::new();
    io::stdin()
        .read_to_end(&mut source)
        .context("failed to read stdin")?;

    let output = match format {
        Format::Go => runner.generate(STDIN_LABEL, &source)?,
        Format::Json => {
            let unit = runner.describe(STDIN_LABEL, &source)?;
            let mut json = serde_json::to_string_pretty(&unit)?;
            json.push('\n');
            json
        }
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write stdout")?;
    Ok(())
}

/// Walk every directory in order.
fn run_dirs(runner: &Runner, dirs: &[PathBuf]) -> anyhow::Result<()> {
    let mut total = BatchSummary::default();
    for dir in dirs {
        let summary = runner.run_tree(dir)?;
        tracing::info!(
            dir = %dir.display(),
            generated = summary.generated,
            skipped = summary.skipped,
            excluded = summary.excluded,
            "finished directory"
        );
        total.generated += summary.generated;
        total.skipped += summary.skipped;
        total.excluded += summary.excluded;
    }

    if total.generated == 0 {
        tracing::warn!(
            input = %runner.config().input_file_name,
            "no input files were generated"
        );
    }
    Ok(())
}
