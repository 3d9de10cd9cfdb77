use std::fmt;
use std::time::Duration;

use colored::Colorize;

use crate::aggregator::{Report, ReportEntry, Stats};
use crate::outcome::Status;

impl Report {
    /// One `test <id> ... <status>` line per entry.
    pub const fn display_results(&self) -> DisplayResults<'_> {
        DisplayResults { report: self }
    }

    /// A section per unsuccessful entry with its traceback and captured
    /// output, or a single line each when `concise`.
    pub const fn display_diagnostics(&self, concise: bool) -> DisplayDiagnostics<'_> {
        DisplayDiagnostics {
            report: self,
            concise,
        }
    }

    pub fn has_diagnostics(&self) -> bool {
        self.entries()
            .iter()
            .any(|entry| entry.outcome.is_unsuccessful())
    }
}

impl Stats {
    pub const fn display(&self, elapsed: Duration) -> DisplayStats<'_> {
        DisplayStats {
            stats: self,
            elapsed,
        }
    }
}

pub struct DisplayResults<'a> {
    report: &'a Report,
}

impl fmt::Display for DisplayResults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.report.entries() {
            let label = match &entry.outcome.status {
                Status::Passed => "ok".green(),
                Status::Failed { .. } => "FAILED".red(),
                Status::Errored { .. } => "ERROR".red(),
                Status::Skipped { .. } => "skipped".yellow(),
            };
            writeln!(f, "test {} ... {label}", entry.id)?;
        }
        Ok(())
    }
}

pub struct DisplayDiagnostics<'a> {
    report: &'a Report,
    concise: bool,
}

impl DisplayDiagnostics<'_> {
    fn write_full(f: &mut fmt::Formatter<'_>, entry: &ReportEntry) -> fmt::Result {
        writeln!(f, "{}", header(entry).bold())?;
        if let Some(detail) = entry.outcome.detail() {
            writeln!(f, "{}", detail.trim_end())?;
        }
        if !entry.outcome.output.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", "captured output:".bold())?;
            writeln!(f, "{}", entry.outcome.output.trim_end())?;
        }
        writeln!(f)
    }
}

impl fmt::Display for DisplayDiagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.report.entries() {
            if !entry.outcome.is_unsuccessful() {
                continue;
            }

            if self.concise {
                let summary = entry
                    .outcome
                    .detail()
                    .and_then(|detail| detail.lines().rev().find(|line| !line.trim().is_empty()))
                    .unwrap_or_default();
                writeln!(f, "{}: {}", header_name(entry).bold(), summary.trim())?;
            } else {
                Self::write_full(f, entry)?;
            }
        }
        Ok(())
    }
}

fn header_name(entry: &ReportEntry) -> String {
    match entry.outcome.error_kind() {
        Some(kind) => format!("{} ({kind})", entry.id),
        None => entry.id.to_string(),
    }
}

fn header(entry: &ReportEntry) -> String {
    format!("---- {} ----", header_name(entry))
}

pub struct DisplayStats<'a> {
    stats: &'a Stats,
    elapsed: Duration,
}

impl fmt::Display for DisplayStats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = if self.stats.is_success() {
            "ok".green()
        } else {
            "FAILED".red()
        };

        writeln!(
            f,
            "test result: {result}. {} passed; {} failed; {} errored; {} skipped; finished in {}",
            self.stats.passed,
            self.stats.failed,
            self.stats.errored,
            self.stats.skipped,
            format_duration(self.elapsed),
        )
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 60 {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
