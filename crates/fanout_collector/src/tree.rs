use camino::Utf8Path;

use crate::discovered::DiscoveredModule;
use crate::unit::{TestUnit, UnitId};

/// A module that could not be loaded.
///
/// It occupies one slot in discovery order and is reported as a single
/// errored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryFailure {
    index: usize,
    module: String,
    detail: String,
}

impl DiscoveryFailure {
    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    name: String,
    sequential: bool,
    units: Vec<TestUnit>,
}

impl ClassNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the class itself carries the sequential marker.
    pub const fn is_sequential(&self) -> bool {
        self.sequential
    }

    pub fn units(&self) -> &[TestUnit] {
        &self.units
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    name: String,
    sequential: bool,
    classes: Vec<ClassNode>,
    failure: Option<DiscoveryFailure>,
}

impl ModuleNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the module itself carries the sequential marker.
    pub const fn is_sequential(&self) -> bool {
        self.sequential
    }

    pub fn classes(&self) -> &[ClassNode] {
        &self.classes
    }

    pub const fn failure(&self) -> Option<&DiscoveryFailure> {
        self.failure.as_ref()
    }
}

/// Every discovered test, grouped as modules, classes and methods.
///
/// Indices are assigned once, in discovery order, across units and
/// discovery failures alike. Filtering removes entries but never renumbers
/// the ones that remain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteTree {
    modules: Vec<ModuleNode>,
}

impl SuiteTree {
    pub fn from_discovery(modules: Vec<DiscoveredModule>) -> Self {
        let mut next_index = 0;
        let mut nodes = Vec::with_capacity(modules.len());

        for module in modules {
            if let Some(detail) = module.error {
                tracing::debug!(module = %module.name, "Module failed to load");
                nodes.push(ModuleNode {
                    failure: Some(DiscoveryFailure {
                        index: next_index,
                        module: module.name.clone(),
                        detail,
                    }),
                    name: module.name,
                    sequential: module.sequential,
                    classes: Vec::new(),
                });
                next_index += 1;
                continue;
            }

            let classes = module
                .classes
                .into_iter()
                .map(|class| {
                    // A marker on the module covers every class in it.
                    let sequential = module.sequential || class.sequential;
                    let units = class
                        .methods
                        .into_iter()
                        .map(|method| {
                            let mut attributes = class.attributes.clone();
                            for attribute in method.attributes {
                                if !attributes.contains(&attribute) {
                                    attributes.push(attribute);
                                }
                            }

                            let id = UnitId::new(&module.name, &class.name, method.name);
                            let unit = TestUnit::new(id, sequential, next_index, attributes);
                            next_index += 1;
                            unit
                        })
                        .collect();

                    ClassNode {
                        name: class.name,
                        sequential: class.sequential,
                        units,
                    }
                })
                .collect();

            nodes.push(ModuleNode {
                name: module.name,
                sequential: module.sequential,
                classes,
                failure: None,
            });
        }

        tracing::debug!(entries = next_index, "Built suite tree");

        Self { modules: nodes }
    }

    /// A tree whose only entry is the failure to read `root` at all.
    pub fn unreadable_root(root: &Utf8Path, detail: impl Into<String>) -> Self {
        Self::from_discovery(vec![DiscoveredModule::failed(root.as_str(), detail)])
    }

    pub fn modules(&self) -> &[ModuleNode] {
        &self.modules
    }

    /// All units in discovery order.
    pub fn units(&self) -> impl Iterator<Item = &TestUnit> {
        self.modules
            .iter()
            .flat_map(|module| &module.classes)
            .flat_map(|class| &class.units)
    }

    /// All discovery failures in discovery order.
    pub fn failures(&self) -> impl Iterator<Item = &DiscoveryFailure> {
        self.modules
            .iter()
            .filter_map(|module| module.failure.as_ref())
    }

    pub fn unit_count(&self) -> usize {
        self.units().count()
    }

    /// Units plus discovery failures.
    pub fn len(&self) -> usize {
        self.unit_count() + self.failures().count()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Keeps only the units for which `keep` returns true. Classes and
    /// modules left without units are dropped; discovery failures are
    /// always kept.
    pub fn retain(&mut self, mut keep: impl FnMut(&TestUnit) -> bool) {
        for module in &mut self.modules {
            for class in &mut module.classes {
                class.units.retain(&mut keep);
            }
            module.classes.retain(|class| !class.units.is_empty());
        }
        self.modules
            .retain(|module| module.failure.is_some() || !module.classes.is_empty());
    }
}
