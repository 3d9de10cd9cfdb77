use std::ffi::OsString;
use std::io;
use std::process::{ExitCode, Termination};

use anyhow::Context as _;
use camino::Utf8PathBuf;
use clap::Parser;
use colored::Colorize;
use fanout_cli::Verbosity;
use fanout_coverage::{SliceId, with_instrumentation};
use fanout_logging::setup_tracing;
use fanout_python::PythonFramework;

use crate::serve;

/// Command-line arguments for the `fanout_worker` process.
///
/// Workers are started by the main `fanout` process, one per slot in the
/// pool, and are not meant to be run by hand.
#[derive(Parser)]
#[command(name = "fanout_worker", about = "fanout test worker")]
struct Args {
    /// Numeric identifier for this worker in the pool.
    #[arg(long)]
    worker_id: usize,

    /// Directory test module names are relative to.
    #[arg(long)]
    top_level_dir: Utf8PathBuf,

    /// Record line coverage and write it to this directory on exit.
    #[arg(long)]
    coverage_dir: Option<Utf8PathBuf>,

    #[clap(flatten)]
    verbosity: Verbosity,
}

#[derive(Copy, Clone)]
pub enum ExitStatus {
    /// Every request was answered.
    Success = 0,

    /// The worker could not start or lost its connection.
    Error = 2,
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

impl ExitStatus {
    pub const fn to_i32(self) -> i32 {
        self as i32
    }
}

pub fn fanout_worker_main(f: impl FnOnce(Vec<OsString>) -> Vec<OsString>) -> ExitStatus {
    run(f).unwrap_or_else(|error| {
        use std::io::Write;

        let mut stderr = std::io::stderr().lock();

        writeln!(stderr, "{}", "fanout worker failed".red().bold()).ok();
        for cause in error.chain() {
            if let Some(ioerr) = cause.downcast_ref::<io::Error>() {
                if ioerr.kind() == io::ErrorKind::BrokenPipe {
                    return ExitStatus::Success;
                }
            }

            writeln!(stderr, "  {} {cause}", "Cause:".bold()).ok();
        }

        ExitStatus::Error
    })
}

fn run(f: impl FnOnce(Vec<OsString>) -> Vec<OsString>) -> anyhow::Result<ExitStatus> {
    let args = wild::args_os();

    let args = f(
        argfile::expand_args_from(args, argfile::parse_fromfile, argfile::PREFIX)
            .context("Failed to read CLI arguments from file")?,
    );

    let args = Args::parse_from(args);

    let _guard = setup_tracing(args.verbosity.level());

    let framework = PythonFramework::new(&args.top_level_dir)?;
    framework.route_stdout_to_stderr()?;

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();

    let served = match &args.coverage_dir {
        Some(coverage_dir) => {
            let mut tracer = framework.tracer();
            with_instrumentation(
                &mut tracer,
                SliceId::worker(args.worker_id),
                coverage_dir,
                || serve(&framework, stdin, stdout),
            )
        }
        None => serve(&framework, stdin, stdout),
    }?;

    tracing::debug!(worker = args.worker_id, served, "Worker finished");

    Ok(ExitStatus::Success)
}
