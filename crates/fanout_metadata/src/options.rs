use fanout_logging::TerminalColor;
use serde::Deserialize;

use crate::combine::Combine;

/// The options accepted in `fanout.toml` or `[tool.fanout]` in `pyproject.toml`.
///
/// Every field is optional so that files, command-line flags and defaults can
/// be layered with [`Combine`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    pub discovery: Option<DiscoveryOptions>,
    pub run: Option<RunOptions>,
    pub report: Option<ReportOptions>,
    pub terminal: Option<TerminalOptions>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DiscoveryOptions {
    /// Glob matched against file names when looking for test modules.
    pub pattern: Option<String>,

    /// Directory that module names are computed relative to.
    pub top_level_dir: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunOptions {
    /// Number of worker processes.
    pub workers: Option<usize>,

    /// Collect line coverage in every worker and merge it after the run.
    pub coverage: Option<bool>,

    /// Where per-run scratch data (coverage slices) is written.
    pub cache_dir: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReportOptions {
    /// Write an xunit-compatible XML report to this path.
    pub junit_xml: Option<String>,

    /// Only run tests whose id matches one of these regular expressions.
    #[serde(rename = "match")]
    pub name_patterns: Option<Vec<String>>,

    /// Only run tests whose class or method has one of these attributes set
    /// to a truthy value.
    #[serde(rename = "attr")]
    pub attributes: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TerminalOptions {
    pub color: Option<TerminalColor>,
    pub output_format: Option<OutputFormat>,
}

/// How failure diagnostics are printed.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// The full traceback of every failure.
    #[default]
    Full,

    /// One line per failure.
    Concise,
}

impl Combine for Options {
    fn combine_with(&mut self, other: Self) {
        self.discovery.combine_with(other.discovery);
        self.run.combine_with(other.run);
        self.report.combine_with(other.report);
        self.terminal.combine_with(other.terminal);
    }
}

impl Combine for DiscoveryOptions {
    fn combine_with(&mut self, other: Self) {
        self.pattern.combine_with(other.pattern);
        self.top_level_dir.combine_with(other.top_level_dir);
    }
}

impl Combine for RunOptions {
    fn combine_with(&mut self, other: Self) {
        self.workers.combine_with(other.workers);
        self.coverage.combine_with(other.coverage);
        self.cache_dir.combine_with(other.cache_dir);
    }
}

impl Combine for ReportOptions {
    fn combine_with(&mut self, other: Self) {
        self.junit_xml.combine_with(other.junit_xml);
        self.name_patterns.combine_with(other.name_patterns);
        self.attributes.combine_with(other.attributes);
    }
}

impl Combine for TerminalOptions {
    fn combine_with(&mut self, other: Self) {
        self.color.combine_with(other.color);
        self.output_format.combine_with(other.output_format);
    }
}
