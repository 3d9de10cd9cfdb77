mod printer;
mod tracing_setup;

pub use printer::{Printer, Stdout, StdoutLock};
pub use tracing_setup::{TracingGuard, setup_tracing};

/// How much the user asked to see, derived from `-q` / `-v` flags.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// `-q`: only the final summary line.
    Quiet,

    /// Per-test lines, diagnostics and the summary.
    #[default]
    Default,

    /// `-v`: also info-level logs.
    Verbose,

    /// `-vv`: debug-level logs, rendered as a tree.
    ExtraVerbose,

    /// `-vvv`: everything.
    Trace,
}

impl VerbosityLevel {
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// The log filter used when `FANOUT_LOG` is not set.
    pub(crate) const fn default_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Default => "warn",
            Self::Verbose => "info",
            Self::ExtraVerbose => "debug",
            Self::Trace => "trace",
        }
    }

    /// The flag spelling that reproduces this level in a child process.
    pub const fn as_flag(self) -> Option<&'static str> {
        match self {
            Self::Quiet => Some("-q"),
            Self::Default => None,
            Self::Verbose => Some("-v"),
            Self::ExtraVerbose => Some("-vv"),
            Self::Trace => Some("-vvv"),
        }
    }
}

/// Control when colored output is used.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalColor {
    /// Display colors if the output goes to an interactive terminal.
    #[default]
    Auto,

    /// Always display colors.
    Always,

    /// Never display colors.
    Never,
}

/// Forces `colored` on or off unless the choice is left to terminal detection.
pub fn set_colored_override(color: Option<TerminalColor>) {
    match color.unwrap_or_default() {
        TerminalColor::Auto => colored::control::unset_override(),
        TerminalColor::Always => colored::control::set_override(true),
        TerminalColor::Never => colored::control::set_override(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels_are_ordered() {
        assert!(VerbosityLevel::Quiet < VerbosityLevel::Default);
        assert!(VerbosityLevel::Verbose < VerbosityLevel::Trace);
        assert!(VerbosityLevel::Quiet.is_quiet());
        assert!(!VerbosityLevel::Verbose.is_quiet());
    }

    #[test]
    fn flags_round_trip_through_child_processes() {
        assert_eq!(VerbosityLevel::Default.as_flag(), None);
        assert_eq!(VerbosityLevel::ExtraVerbose.as_flag(), Some("-vv"));
    }
}
