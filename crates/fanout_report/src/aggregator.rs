use std::collections::BTreeMap;

use fanout_collector::{SuiteTree, UnitId};

use crate::outcome::{ErrorKind, Outcome, Status};

/// What a report entry describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryId {
    Unit(UnitId),

    /// A module that failed to load.
    Module(String),
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit(id) => write!(f, "{id}"),
            Self::Module(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub index: usize,
    pub id: EntryId,
    pub outcome: Outcome,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
}

impl Stats {
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped
    }

    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    fn add(&mut self, outcome: &Outcome) {
        match outcome.status {
            Status::Passed => self.passed += 1,
            Status::Failed { .. } => self.failed += 1,
            Status::Errored { .. } => self.errored += 1,
            Status::Skipped { .. } => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

/// The final, immutable result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    entries: Vec<ReportEntry>,
    stats: Stats,
}

impl Report {
    /// Entries in discovery order.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    pub const fn status(&self) -> RunStatus {
        if self.stats.is_success() {
            RunStatus::Success
        } else {
            RunStatus::Failure
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.status(), RunStatus::Success)
    }
}

struct Slot {
    id: EntryId,
    outcome: Option<Outcome>,
}

/// Collects outcomes from workers and the sequential runner, in any order,
/// and assembles them into a [`Report`] in discovery order.
pub struct Aggregator {
    slots: BTreeMap<usize, Slot>,
}

impl Aggregator {
    /// Reserves one slot for every unit and discovery failure in `tree`.
    /// Discovery failures are filled in immediately.
    pub fn new(tree: &SuiteTree) -> Self {
        let mut slots = BTreeMap::new();

        for unit in tree.units() {
            slots.insert(
                unit.index(),
                Slot {
                    id: EntryId::Unit(unit.id().clone()),
                    outcome: None,
                },
            );
        }

        for failure in tree.failures() {
            slots.insert(
                failure.index(),
                Slot {
                    id: EntryId::Module(failure.module().to_string()),
                    outcome: Some(Outcome::errored(ErrorKind::Discovery, failure.detail())),
                },
            );
        }

        Self { slots }
    }

    /// Records the outcome of the entry at `index`. The first outcome for an
    /// entry wins.
    pub fn record(&mut self, index: usize, outcome: Outcome) {
        let Some(slot) = self.slots.get_mut(&index) else {
            tracing::warn!(index, "Ignoring outcome for an unknown test");
            return;
        };

        if slot.outcome.is_some() {
            tracing::warn!(test = %slot.id, "Ignoring duplicate outcome");
            return;
        }

        slot.outcome = Some(outcome);
    }

    pub fn finish(self) -> Report {
        let mut stats = Stats::default();

        let entries = self
            .slots
            .into_iter()
            .map(|(index, slot)| {
                let outcome = slot.outcome.unwrap_or_else(|| {
                    tracing::debug!(test = %slot.id, "No outcome recorded");
                    Outcome::incomplete()
                });
                stats.add(&outcome);
                ReportEntry {
                    index,
                    id: slot.id,
                    outcome,
                }
            })
            .collect();

        Report { entries, stats }
    }
}
