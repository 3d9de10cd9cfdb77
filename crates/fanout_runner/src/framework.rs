use std::collections::{HashMap, VecDeque};

use camino::Utf8PathBuf;
use fanout_collector::{DiscoveredModule, UnitId};
use fanout_report::{ErrorKind, Outcome, Status};

/// Where and how to look for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    pub start_dir: Utf8PathBuf,
    pub pattern: String,
    pub top_level_dir: Utf8PathBuf,

    /// Attribute names to report on each discovered class and method.
    pub attributes: Vec<String>,
}

/// One result as the framework reported it.
///
/// `test_id` is the framework's own name for what ran. For test methods
/// that is the unit id; for class or module fixtures it is a description
/// such as `setUpClass (test_mod.Case)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub test_id: String,
    pub outcome: Outcome,
}

impl RecordedRun {
    pub fn new(test_id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            test_id: test_id.into(),
            outcome,
        }
    }
}

/// The test-case framework whose suites are being run.
///
/// The engine never runs a test itself; it only decides what runs where and
/// collects what the framework reports.
pub trait TestFramework {
    /// Lists the modules, classes and methods under the start directory, in
    /// the order the framework would run them.
    fn discover(&self, request: &DiscoveryRequest) -> anyhow::Result<Vec<DiscoveredModule>>;

    /// Runs `units` as one batch through the framework's own suite
    /// machinery, so class and module fixtures run once per batch.
    fn run(&self, units: &[UnitId]) -> anyhow::Result<Vec<RecordedRun>>;
}

/// Runs `units` and returns exactly one outcome per unit, in order.
///
/// A failure to run the batch at all becomes an errored outcome for every
/// unit in it.
pub fn run_units(framework: &dyn TestFramework, units: &[UnitId]) -> Vec<Outcome> {
    match framework.run(units) {
        Ok(records) => assign_outcomes(units, records),
        Err(err) => {
            tracing::warn!("Failed to run {} test(s): {err:#}", units.len());
            let detail = format!("{err:#}");
            units
                .iter()
                .map(|_| Outcome::errored(ErrorKind::Test, detail.clone()))
                .collect()
        }
    }
}

/// Maps framework records onto `units`.
///
/// Records for a test method go to that unit. A test listed more than once
/// (a class imported into a second module, say) runs once per listing, so
/// its records fill the listings in order; any record beyond that is folded
/// into the last one. Records for
/// fixtures go to every unit of the class or module they name, as errors of
/// kind [`ErrorKind::Fixture`]. A unit nobody reported on is incomplete.
pub fn assign_outcomes(units: &[UnitId], records: Vec<RecordedRun>) -> Vec<Outcome> {
    let mut positions: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (position, id) in units.iter().enumerate() {
        positions
            .entry(id.to_string())
            .or_default()
            .push_back(position);
    }

    let mut outcomes: Vec<Option<Outcome>> = vec![None; units.len()];

    for record in records {
        if let Some(queue) = positions.get_mut(&record.test_id) {
            // The last listing stays queued for extra records.
            let position = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().copied()
            };
            if let Some(position) = position {
                merge(&mut outcomes[position], record.outcome);
                continue;
            }
        }

        let Some(target) = fixture_target(&record.test_id) else {
            tracing::warn!(test = %record.test_id, "Ignoring result for an unknown test");
            continue;
        };

        let fixture_outcome = match &record.outcome.status {
            Status::Passed => continue,
            // `SkipTest` raised by a class or module setup skips every test in it.
            Status::Skipped { reason } => Outcome::skipped(reason.clone()),
            Status::Failed { detail } | Status::Errored { detail, .. } => {
                Outcome::errored(ErrorKind::Fixture, format!("{}\n{detail}", record.test_id))
            }
        };

        let mut matched = false;
        for (position, id) in units.iter().enumerate() {
            if id.module == target || id.class_path() == target {
                merge(&mut outcomes[position], fixture_outcome.clone());
                matched = true;
            }
        }

        if !matched {
            tracing::warn!(fixture = %record.test_id, "Fixture error matches no scheduled test");
        }
    }

    outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap_or_else(Outcome::incomplete))
        .collect()
}

fn merge(slot: &mut Option<Outcome>, outcome: Outcome) {
    match slot {
        Some(existing) => existing.absorb(outcome),
        None => *slot = Some(outcome),
    }
}

/// `setUpClass (test_mod.Case)` names `test_mod.Case`.
fn fixture_target(test_id: &str) -> Option<&str> {
    let (_, rest) = test_id.split_once(" (")?;
    rest.strip_suffix(')')
}
