use camino::Utf8PathBuf;
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use fanout_logging::{TerminalColor, VerbosityLevel};
use fanout_metadata::{DiscoveryOptions, Options, ReportOptions, RunOptions, TerminalOptions};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(clap::Args, Debug, Clone, Default)]
#[command(about = None, long_about = None)]
pub struct Verbosity {
    #[arg(
        long,
        short = 'v',
        help = "Use verbose output (or `-vv` and `-vvv` for more verbose output)",
        action = clap::ArgAction::Count,
        global = true,
        overrides_with = "quiet",
    )]
    verbose: u8,

    #[arg(
        long,
        short,
        help = "Use quiet output",
        action = clap::ArgAction::Count,
        global = true,
        overrides_with = "verbose",
    )]
    quiet: u8,
}

impl Verbosity {
    /// Returns the verbosity level based on the number of `-v` and `-q` flags.
    pub const fn level(&self) -> VerbosityLevel {
        // `--quiet` and `--verbose` are mutually exclusive in Clap, so we can just check one first.
        match self.quiet {
            0 => {}
            _ => return VerbosityLevel::Quiet,
        }

        match self.verbose {
            0 => VerbosityLevel::Default,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::ExtraVerbose,
            _ => VerbosityLevel::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, name = "fanout", about = "Run unittest suites in parallel worker processes.")]
#[command(version)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Discover and run tests.
    Test(TestCommand),

    /// Display fanout's version.
    Version,
}

#[derive(Debug, Parser)]
pub struct TestCommand {
    /// Directory to start discovery from [default: the project root].
    #[clap(value_name = "START_DIR")]
    pub start_dir: Option<Utf8PathBuf>,

    /// File-name pattern test modules must match [default: test*.py].
    #[clap(short = 'p', long)]
    pub pattern: Option<String>,

    /// Directory module names are relative to [default: START_DIR].
    #[clap(short = 't', long, value_name = "DIR")]
    pub top_level_dir: Option<String>,

    /// Number of worker processes (default: number of CPU cores).
    #[clap(short = 'n', long)]
    pub num_workers: Option<usize>,

    /// Run every test in a single worker (equivalent to `--num-workers 1`).
    #[clap(long, default_missing_value = "true", num_args=0..1)]
    pub no_parallel: Option<bool>,

    /// Collect line coverage in every worker and merge it after the run.
    #[clap(long, default_missing_value = "true", num_args=0..1)]
    pub coverage: Option<bool>,

    /// Write an xunit-compatible XML report to this path.
    #[clap(long, value_name = "PATH")]
    pub junit_xml: Option<String>,

    /// Only run tests whose id matches this regular expression.
    ///
    /// Uses partial matching. When given multiple times, a test runs if it
    /// matches any of the patterns.
    ///
    /// Examples: `-m auth`, `-m '^test_api\.'`, `-m 'slow|fast'`.
    #[clap(short = 'm', long = "match")]
    pub name_patterns: Vec<String>,

    /// Only run tests whose class or method has this attribute set to a
    /// truthy value.
    ///
    /// When given multiple times, a test runs if it has any of the
    /// attributes. Example: `-a slow` selects `test_x` after `test_x.slow = True`.
    #[clap(short = 'a', long = "attr", value_name = "ATTRIBUTE")]
    pub attributes: Vec<String>,

    /// The path to a `fanout.toml` file to use for configuration.
    ///
    /// While fanout configuration can be included in a `pyproject.toml` file, it is not allowed in this context.
    #[arg(long, env = "FANOUT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<Utf8PathBuf>,

    /// Print the execution plan without running anything.
    #[clap(long)]
    pub dry_run: bool,

    #[clap(flatten)]
    pub display: DisplayArgs,
}

/// Display options shared by the main CLI and worker processes.
#[derive(Debug, Parser, Clone, Default)]
pub struct DisplayArgs {
    /// The format to use for printing failure diagnostics.
    #[arg(long)]
    pub output_format: Option<OutputFormat>,

    /// Do not print a line for every test result.
    #[clap(long, default_missing_value = "true", num_args=0..1)]
    pub no_progress: Option<bool>,

    /// Control when colored output is used.
    #[arg(long)]
    pub color: Option<TerminalColor>,

    #[clap(flatten)]
    pub verbosity: Verbosity,
}

impl TestCommand {
    pub const fn verbosity(&self) -> &Verbosity {
        &self.display.verbosity
    }

    /// The options given on the command line, to be layered over the file options.
    pub fn to_options(&self) -> Options {
        let workers = if self.no_parallel.unwrap_or(false) {
            Some(1)
        } else {
            self.num_workers
        };

        Options {
            discovery: Some(DiscoveryOptions {
                pattern: self.pattern.clone(),
                top_level_dir: self.top_level_dir.clone(),
            }),
            run: Some(RunOptions {
                workers,
                coverage: self.coverage,
                cache_dir: None,
            }),
            report: Some(ReportOptions {
                junit_xml: self.junit_xml.clone(),
                name_patterns: (!self.name_patterns.is_empty())
                    .then(|| self.name_patterns.clone()),
                attributes: (!self.attributes.is_empty()).then(|| self.attributes.clone()),
            }),
            terminal: Some(TerminalOptions {
                color: self.display.color,
                output_format: self.display.output_format.map(Into::into),
            }),
        }
    }
}

/// The diagnostic output format.
#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, PartialOrd, Ord, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Print the full traceback of every failure (default).
    #[default]
    #[value(name = "full")]
    Full,

    /// Print one line per failure.
    #[value(name = "concise")]
    Concise,
}

impl From<OutputFormat> for fanout_metadata::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => Self::Full,
            OutputFormat::Concise => Self::Concise,
        }
    }
}
