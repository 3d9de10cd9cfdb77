//! Outcomes of individual tests and the report assembled from them.

mod aggregator;
mod display;
mod junit;
mod outcome;

pub use aggregator::{Aggregator, EntryId, Report, ReportEntry, RunStatus, Stats};
pub use display::{DisplayDiagnostics, DisplayResults, DisplayStats};
pub use outcome::{ErrorKind, Outcome, Status};
