use fanout_collector::{TestUnit, UnitId};
use fanout_report::Outcome;

use crate::framework::{TestFramework, run_units};

/// Runs `units` in this process, in the given order, as a single batch.
///
/// Returns each unit's discovery index with its outcome.
pub fn run_sequential(framework: &dyn TestFramework, units: &[TestUnit]) -> Vec<(usize, Outcome)> {
    if units.is_empty() {
        return Vec::new();
    }

    tracing::debug!(count = units.len(), "Running sequential tests");

    let ids: Vec<UnitId> = units.iter().map(|unit| unit.id().clone()).collect();
    let outcomes = run_units(framework, &ids);

    units.iter().map(TestUnit::index).zip(outcomes).collect()
}
