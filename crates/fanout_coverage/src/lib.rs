//! Line coverage collected in many processes and merged into one data set.
//!
//! Every worker (and the in-process sequential runner) records its own
//! [`CoverageSlice`] and writes it into the run's [`CoverageRun`]
//! directory. Once all of them have exited, the slices are merged into a
//! [`CoverageSet`].

mod data;
mod storage;
mod summary;

pub use data::{CoverageSet, CoverageSlice, DuplicateSliceError, FileHits, SliceId};
pub use storage::{
    CoverageError, CoverageRun, read_slice, slice_path, write_combined, write_slice,
};
pub use summary::{CoverageSummary, FileSummary};

/// Line instrumentation for the code under test.
///
/// `start` is called before the first test a process runs and `stop` after
/// its last one.
pub trait Instrumentation {
    fn start(&mut self) -> anyhow::Result<()>;

    /// Stops recording and returns everything recorded since `start`.
    fn stop(&mut self) -> anyhow::Result<FileHits>;
}

/// Runs `f` with `instrumentation` active and writes the recorded slice to
/// `dir`. Instrumentation failures are logged and never affect `f`'s result.
pub fn with_instrumentation<T>(
    instrumentation: &mut dyn Instrumentation,
    id: SliceId,
    dir: &camino::Utf8Path,
    f: impl FnOnce() -> T,
) -> T {
    let started = match instrumentation.start() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("Failed to start coverage for `{id}`: {err:#}");
            false
        }
    };

    let result = f();

    if started {
        match instrumentation.stop() {
            Ok(files) => {
                if let Err(err) = write_slice(dir, &CoverageSlice::new(id, files)) {
                    tracing::warn!("{err}");
                }
            }
            Err(err) => tracing::warn!("Failed to stop coverage for `{id}`: {err:#}"),
        }
    }

    result
}
