use std::io::{self, Write};

use crate::VerbosityLevel;

/// Decides which user-facing output streams are enabled for a run.
///
/// Every piece of user-facing output is written through one of the
/// `stream_for_*` methods so that `-q` consistently silences details.
#[derive(Debug, Copy, Clone, Default)]
pub struct Printer {
    verbosity: VerbosityLevel,
    no_progress: bool,
}

impl Printer {
    pub const fn new(verbosity: VerbosityLevel, no_progress: bool) -> Self {
        Self {
            verbosity,
            no_progress,
        }
    }

    pub const fn verbosity(self) -> VerbosityLevel {
        self.verbosity
    }

    /// Output the user explicitly asked for, such as `--dry-run` listings.
    pub const fn stream_for_requested_summary(self) -> Stdout {
        Stdout::enabled()
    }

    /// Per-test result lines.
    pub const fn stream_for_test_result(self) -> Stdout {
        if self.verbosity.is_quiet() || self.no_progress {
            Stdout::disabled()
        } else {
            Stdout::enabled()
        }
    }

    /// Failure diagnostics and other detail sections.
    pub const fn stream_for_details(self) -> Stdout {
        if self.verbosity.is_quiet() {
            Stdout::disabled()
        } else {
            Stdout::enabled()
        }
    }

    /// The final summary line, shown at every verbosity.
    pub const fn stream_for_failure_summary(self) -> Stdout {
        Stdout::enabled()
    }
}

/// A possibly-disabled handle to stdout.
#[derive(Debug, Copy, Clone)]
pub struct Stdout {
    enabled: bool,
}

impl Stdout {
    const fn enabled() -> Self {
        Self { enabled: true }
    }

    const fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn lock(self) -> StdoutLock {
        StdoutLock {
            inner: self.enabled.then(|| io::stdout().lock()),
        }
    }
}

/// A locked stdout that silently discards writes when disabled.
pub struct StdoutLock {
    inner: Option<io::StdoutLock<'static>>,
}

impl StdoutLock {
    pub const fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl Write for StdoutLock {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            Some(inner) => inner.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Write for StdoutLock {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.write_all(s.as_bytes()).map_err(|_| std::fmt::Error)
    }
}
