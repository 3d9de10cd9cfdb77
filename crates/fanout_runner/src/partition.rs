use fanout_collector::{SuiteTree, TestUnit};

/// Which units run in workers and which run in-process, in order.
///
/// Derived once from a [`SuiteTree`] and never changed; the same tree always
/// gives the same plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    sequential: Vec<TestUnit>,
    parallel: Vec<TestUnit>,
}

impl ExecutionPlan {
    pub fn from_tree(tree: &SuiteTree) -> Self {
        let mut plan = Self::default();

        // Markers were resolved onto each unit when the tree was built.
        for unit in tree.units() {
            if unit.is_sequential() {
                plan.sequential.push(unit.clone());
            } else {
                plan.parallel.push(unit.clone());
            }
        }

        tracing::debug!(
            sequential = plan.sequential.len(),
            parallel = plan.parallel.len(),
            "Partitioned tests"
        );

        plan
    }

    /// Units that must run in-process, in discovery order.
    pub fn sequential(&self) -> &[TestUnit] {
        &self.sequential
    }

    /// Units that may run in any worker, in discovery order.
    pub fn parallel(&self) -> &[TestUnit] {
        &self.parallel
    }

    pub fn len(&self) -> usize {
        self.sequential.len() + self.parallel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
