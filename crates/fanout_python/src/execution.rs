use std::time::Duration;

use fanout_collector::UnitId;
use fanout_report::{ErrorKind, Outcome};
use fanout_runner::RecordedRun;
use pyo3::prelude::*;

/// `(test_id, status, detail, output, elapsed_seconds)`
type RawRecord = (String, String, Option<String>, String, f64);

/// Loads `units` by name into one suite and runs it with the outcome
/// recorder, so class and module fixtures run once for the whole batch.
pub(crate) fn run(shim: &Bound<'_, PyModule>, units: &[UnitId]) -> anyhow::Result<Vec<RecordedRun>> {
    let names: Vec<String> = units.iter().map(ToString::to_string).collect();
    let raw: Vec<RawRecord> = shim.call_method1("run", (names,))?.extract()?;

    raw.into_iter().map(into_record).collect()
}

fn into_record((test_id, status, detail, output, elapsed): RawRecord) -> anyhow::Result<RecordedRun> {
    let detail = detail.unwrap_or_default();
    let outcome = match status.as_str() {
        "passed" => Outcome::passed(),
        "failed" => Outcome::failed(detail),
        "errored" => Outcome::errored(ErrorKind::Test, detail),
        "skipped" => Outcome::skipped(detail),
        other => anyhow::bail!("Unknown status `{other}` reported for `{test_id}`"),
    };

    let elapsed = Duration::try_from_secs_f64(elapsed).unwrap_or_default();

    Ok(RecordedRun::new(
        test_id,
        outcome.with_output(output).with_elapsed(elapsed),
    ))
}
