use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{ExitCode, Termination};
use std::time::Instant;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use colored::Colorize;
use fanout_cli::{Args, Command, TestCommand};
use fanout_collector::SuiteTree;
use fanout_logging::{Printer, VerbosityLevel, set_colored_override, setup_tracing};
use fanout_metadata::path::absolute;
use fanout_metadata::{OutputFormat, ProjectMetadata, Settings};
use fanout_python::PythonFramework;
use fanout_runner::{PluginList, RunConfig, RunResult, WorkerCommand};

pub use fanout_runner::CoverageReport;

mod version;

pub fn fanout_main(f: impl FnOnce(Vec<OsString>) -> Vec<OsString>) -> ExitStatus {
    run(f).unwrap_or_else(|error| {
        let mut stderr = std::io::stderr().lock();

        writeln!(stderr, "{}", "fanout failed".red().bold()).ok();
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

    match args.command {
        Command::Test(test_args) => test(test_args),
        Command::Version => version().map(|()| ExitStatus::Success),
    }
}

pub(crate) fn version() -> Result<()> {
    let mut stdout = Printer::default().stream_for_requested_summary().lock();
    if let Some(version_info) = crate::version::version() {
        writeln!(stdout, "fanout {version_info}")?;
    } else {
        writeln!(stdout, "Failed to get fanout version")?;
    }

    Ok(())
}

/// Runs the suite under `root` with `settings` and the plugins they enable.
///
/// Workers are found with the `FANOUT_WORKER_BINARY` environment variable,
/// next to the current executable or on `PATH`, in that order. No Ctrl-C
/// handler is installed.
pub fn execute(root: &Utf8Path, settings: &Settings) -> Result<RunResult> {
    let settings = Settings {
        start_dir: root.to_path_buf(),
        ..settings.clone()
    };
    let mut plugins = PluginList::from_settings(&settings)?;
    let config = RunConfig {
        worker: worker_command(&settings, VerbosityLevel::default())?,
        create_ctrlc_handler: false,
    };

    run_suite(&settings, &mut plugins, &config)
}

fn run_suite(settings: &Settings, plugins: &mut PluginList, config: &RunConfig) -> Result<RunResult> {
    let framework = PythonFramework::new(&settings.top_level_dir)?;
    let mut tracer = framework.tracer();

    fanout_runner::execute(&framework, &mut tracer, settings, plugins, config)
}

fn worker_command(settings: &Settings, verbosity: VerbosityLevel) -> Result<WorkerCommand> {
    let mut command = WorkerCommand::new(fanout_runner::find_worker_binary()?)
        .arg("--top-level-dir")
        .arg(settings.top_level_dir.as_str());

    if let Some(flag) = verbosity.as_flag() {
        command = command.arg(flag);
    }

    Ok(command)
}

pub(crate) fn test(mut args: TestCommand) -> Result<ExitStatus> {
    let verbosity = args.verbosity().level();

    set_colored_override(args.display.color);

    let printer = Printer::new(verbosity, args.display.no_progress.unwrap_or(false));

    let _guard = setup_tracing(verbosity);

    let cwd = {
        let cwd = std::env::current_dir().context("Failed to get the current working directory")?;
        Utf8PathBuf::from_path_buf(cwd)
                .map_err(|path| {
                    anyhow::anyhow!(
                        "The current working directory `{}` contains non-Unicode characters. fanout only supports Unicode paths.",
                        path.display()
                    )
                })?
    };

    tracing::debug!(cwd = %cwd, "Working directory");

    let config_file = args.config_file.as_ref().map(|path| absolute(path, &cwd));

    let mut project_metadata = if let Some(config_file) = config_file {
        ProjectMetadata::from_config_file(config_file, &cwd)?
    } else {
        ProjectMetadata::discover(&cwd)?
    };

    // Paths on the command line are relative to where fanout was started.
    args.top_level_dir = args
        .top_level_dir
        .map(|dir| absolute(dir, &cwd).into_string());
    args.junit_xml = args.junit_xml.map(|path| absolute(path, &cwd).into_string());
    let start_dir = args.start_dir.as_ref().map(|dir| absolute(dir, &cwd));

    project_metadata.apply_overrides(args.to_options());

    if let Some(terminal) = &project_metadata.options().terminal {
        set_colored_override(terminal.color);
    }

    let settings = project_metadata.to_settings(start_dir.as_deref());

    tracing::debug!(?settings, "Resolved settings");

    let mut plugins = PluginList::from_settings(&settings)?;

    if args.dry_run {
        let framework = PythonFramework::new(&settings.top_level_dir)?;
        let tree = fanout_runner::collect(&framework, &settings, &mut plugins)?;
        print_plan(printer, &tree)?;
        return Ok(ExitStatus::Success);
    }

    let config = RunConfig {
        worker: worker_command(&settings, verbosity)?,
        create_ctrlc_handler: true,
    };

    let start_time = Instant::now();

    let result = run_suite(&settings, &mut plugins, &config)?;

    print_test_output(printer, start_time, &result, settings.output_format)?;

    if result.report.is_success() {
        Ok(ExitStatus::Success)
    } else {
        Ok(ExitStatus::Failure)
    }
}

/// Print test output
pub(crate) fn print_test_output(
    printer: Printer,
    start_time: Instant,
    result: &RunResult,
    output_format: OutputFormat,
) -> Result<()> {
    let report = &result.report;

    let mut results = printer.stream_for_test_result().lock();
    write!(results, "{}", report.display_results())?;
    drop(results);

    let mut stdout = printer.stream_for_details().lock();

    if report.has_diagnostics() {
        writeln!(stdout)?;
        writeln!(stdout, "diagnostics:")?;
        writeln!(stdout)?;

        let concise = matches!(output_format, OutputFormat::Concise);
        write!(stdout, "{}", report.display_diagnostics(concise))?;

        if concise {
            writeln!(stdout)?;
        }
    } else if !report.entries().is_empty() {
        writeln!(stdout)?;
    }

    if let Some(coverage) = &result.coverage {
        writeln!(stdout, "coverage:")?;
        writeln!(stdout)?;
        write!(stdout, "{}", coverage.summary)?;
        writeln!(stdout)?;
        writeln!(stdout, "Coverage data written to {}", coverage.data_file)?;
        writeln!(stdout)?;
    }

    drop(stdout);

    let mut result_stdout = printer.stream_for_failure_summary().lock();

    write!(
        result_stdout,
        "{}",
        report.stats().display(start_time.elapsed())
    )?;

    Ok(())
}

/// Print the execution plan in dry-run mode.
fn print_plan(printer: Printer, tree: &SuiteTree) -> Result<()> {
    let mut lines: Vec<(usize, String)> = tree
        .units()
        .map(|unit| {
            let mode = if unit.is_sequential() {
                "sequential"
            } else {
                "parallel"
            };
            (unit.index(), format!("<{mode}> {}", unit.id()))
        })
        .chain(
            tree.failures()
                .map(|failure| (failure.index(), format!("<error> {}", failure.module()))),
        )
        .collect();
    lines.sort_by_key(|(index, _)| *index);

    let mut stdout = printer.stream_for_requested_summary().lock();

    for (_, line) in &lines {
        writeln!(stdout, "{line}")?;
    }

    if !lines.is_empty() {
        writeln!(stdout)?;
    }

    let sequential = tree.units().filter(|unit| unit.is_sequential()).count();
    writeln!(
        stdout,
        "{} tests collected ({} parallel, {sequential} sequential)",
        tree.unit_count(),
        tree.unit_count() - sequential,
    )?;

    Ok(())
}

#[derive(Copy, Clone)]
pub enum ExitStatus {
    /// Every test passed or was skipped.
    Success = 0,

    /// The run completed but a test failed, errored or never finished.
    Failure = 1,

    /// The run could not be completed.
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
