use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The result of running one test unit.
///
/// Outcomes cross the process boundary between workers and the main
/// process, so this is the wire format too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: Status,

    /// Everything the test wrote to stdout and stderr.
    #[serde(default)]
    pub output: String,

    #[serde(default)]
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed { detail: String },
    Errored { kind: ErrorKind, detail: String },
    Skipped { reason: String },
}

/// Why a unit errored instead of producing a pass/fail result.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The test raised something other than an assertion failure.
    Test,

    /// Class or module level setup or teardown failed.
    Fixture,

    /// The module could not be imported.
    Discovery,

    /// The worker process running the unit died.
    WorkerLost,

    /// The unit never produced an outcome.
    Incomplete,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Fixture => "fixture",
            Self::Discovery => "discovery",
            Self::WorkerLost => "worker lost",
            Self::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Outcome {
    pub const fn new(status: Status) -> Self {
        Self {
            status,
            output: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub const fn passed() -> Self {
        Self::new(Status::Passed)
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self::new(Status::Failed {
            detail: detail.into(),
        })
    }

    pub fn errored(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::new(Status::Errored {
            kind,
            detail: detail.into(),
        })
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::new(Status::Skipped {
            reason: reason.into(),
        })
    }

    /// The outcome of a unit that never reported back.
    pub fn incomplete() -> Self {
        Self::errored(ErrorKind::Incomplete, "The test did not produce a result")
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    #[must_use]
    pub const fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub const fn is_passed(&self) -> bool {
        matches!(self.status, Status::Passed)
    }

    /// Failed or errored, including incomplete and lost units.
    pub const fn is_unsuccessful(&self) -> bool {
        matches!(self.status, Status::Failed { .. } | Status::Errored { .. })
    }

    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match &self.status {
            Status::Errored { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The traceback, failure message or skip reason, if any.
    pub fn detail(&self) -> Option<&str> {
        match &self.status {
            Status::Passed => None,
            Status::Failed { detail } | Status::Errored { detail, .. } => Some(detail),
            Status::Skipped { reason } => Some(reason),
        }
    }

    /// Folds a later report about the same unit into this one.
    ///
    /// The framework may report a unit more than once: a subtest failure
    /// after the test itself, or a class teardown error after every method
    /// already passed. A passing or skipped outcome is replaced by the later
    /// error; an already unsuccessful one keeps its status and gains the
    /// later detail.
    pub fn absorb(&mut self, later: Self) {
        if let Status::Failed { detail } | Status::Errored { detail, .. } = &mut self.status {
            if let Some(extra) = later.detail().filter(|_| later.is_unsuccessful()) {
                if !extra.is_empty() {
                    detail.push_str("\n\n");
                    detail.push_str(extra);
                }
            }
        } else if later.is_unsuccessful() {
            self.status = later.status;
        }

        if !later.output.is_empty() {
            self.output.push_str(&later.output);
        }
        self.elapsed += later.elapsed;
    }
}
