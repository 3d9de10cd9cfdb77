use std::fmt;

use serde::{Deserialize, Serialize};

/// The globally unique name of one test method: `module.Class.method`.
///
/// The module part may itself be dotted (`pkg.sub.test_mod`); class and
/// method names never are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    pub module: String,
    pub class: String,
    pub method: String,
}

impl UnitId {
    pub fn new(
        module: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
            method: method.into(),
        }
    }

    /// `module.Class`, the name the framework gives class-level fixtures.
    pub fn class_path(&self) -> String {
        format!("{}.{}", self.module, self.class)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.module, self.class, self.method)
    }
}

/// The smallest schedulable piece of work: one test method.
///
/// Created once by [`SuiteTree::from_discovery`](crate::SuiteTree::from_discovery)
/// and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    id: UnitId,
    sequential: bool,
    index: usize,
    attributes: Vec<String>,
}

impl TestUnit {
    pub(crate) const fn new(
        id: UnitId,
        sequential: bool,
        index: usize,
        attributes: Vec<String>,
    ) -> Self {
        Self {
            id,
            sequential,
            index,
            attributes,
        }
    }

    pub const fn id(&self) -> &UnitId {
        &self.id
    }

    /// Whether this unit must run in-process, in discovery order.
    pub const fn is_sequential(&self) -> bool {
        self.sequential
    }

    /// Position in discovery order.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Truthy attributes of the test's class or method, among those asked
    /// for at discovery.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| attribute == name)
    }
}
