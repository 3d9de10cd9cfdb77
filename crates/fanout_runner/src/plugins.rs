use anyhow::Context;
use camino::Utf8PathBuf;
use fanout_collector::{SuiteTree, TestUnit};
use fanout_metadata::Settings;
use fanout_metadata::filter::NameFilterSet;
use fanout_report::Report;

/// Hooks into the stages of a run.
///
/// Plugins are called in the order they were added. Every hook has a
/// default that does nothing.
pub trait Plugin {
    fn name(&self) -> &'static str;

    fn pre_discovery(&mut self, _settings: &Settings) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called with the tree after filtering, before it is partitioned.
    fn post_discovery(&mut self, _tree: &SuiteTree) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether `unit` should run at all. Units any plugin rejects are
    /// removed from the tree.
    fn accepts(&self, _unit: &TestUnit) -> bool {
        true
    }

    fn report(&mut self, _report: &Report) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct PluginList {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in plugins enabled by `settings`.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut plugins = Self::new();

        let filter = NameFilterSet::new(&settings.name_patterns)?;
        if !filter.is_empty() {
            plugins.push(NameFilter::new(filter));
        }

        if !settings.attributes.is_empty() {
            plugins.push(AttributeFilter::new(settings.attributes.clone()));
        }

        if let Some(path) = &settings.junit_xml {
            plugins.push(JunitReporter::new(path.clone()));
        }

        Ok(plugins)
    }

    pub fn push(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.iter().map(|plugin| plugin.name())
    }

    pub(crate) fn pre_discovery(&mut self, settings: &Settings) -> anyhow::Result<()> {
        for plugin in &mut self.plugins {
            plugin
                .pre_discovery(settings)
                .with_context(|| format!("Plugin `{}` failed before discovery", plugin.name()))?;
        }
        Ok(())
    }

    pub(crate) fn post_discovery(&mut self, tree: &SuiteTree) -> anyhow::Result<()> {
        for plugin in &mut self.plugins {
            plugin
                .post_discovery(tree)
                .with_context(|| format!("Plugin `{}` failed after discovery", plugin.name()))?;
        }
        Ok(())
    }

    pub(crate) fn accepts(&self, unit: &TestUnit) -> bool {
        self.plugins.iter().all(|plugin| plugin.accepts(unit))
    }

    pub(crate) fn report(&mut self, report: &Report) -> anyhow::Result<()> {
        for plugin in &mut self.plugins {
            plugin
                .report(report)
                .with_context(|| format!("Plugin `{}` failed to report", plugin.name()))?;
        }
        Ok(())
    }
}

/// Runs only the tests whose id matches one of the `-m/--match` patterns.
pub struct NameFilter {
    filter: NameFilterSet,
}

impl NameFilter {
    pub const fn new(filter: NameFilterSet) -> Self {
        Self { filter }
    }
}

impl Plugin for NameFilter {
    fn name(&self) -> &'static str {
        "name-filter"
    }

    fn accepts(&self, unit: &TestUnit) -> bool {
        self.filter.matches(&unit.id().to_string())
    }

    fn post_discovery(&mut self, tree: &SuiteTree) -> anyhow::Result<()> {
        tracing::debug!(selected = tree.unit_count(), "Applied name filter");
        Ok(())
    }
}

/// Runs only the tests whose class or method sets one of the `-a/--attr`
/// attributes to a truthy value.
pub struct AttributeFilter {
    attributes: Vec<String>,
}

impl AttributeFilter {
    pub const fn new(attributes: Vec<String>) -> Self {
        Self { attributes }
    }
}

impl Plugin for AttributeFilter {
    fn name(&self) -> &'static str {
        "attribute-filter"
    }

    fn accepts(&self, unit: &TestUnit) -> bool {
        self.attributes
            .iter()
            .any(|attribute| unit.has_attribute(attribute))
    }

    fn post_discovery(&mut self, tree: &SuiteTree) -> anyhow::Result<()> {
        tracing::debug!(
            selected = tree.unit_count(),
            attributes = ?self.attributes,
            "Applied attribute filter"
        );
        Ok(())
    }
}

/// Writes an xunit-compatible XML file once the report is ready.
pub struct JunitReporter {
    path: Utf8PathBuf,
}

impl JunitReporter {
    pub const fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl Plugin for JunitReporter {
    fn name(&self) -> &'static str {
        "junit-xml"
    }

    fn report(&mut self, report: &Report) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create `{parent}`"))?;
            }
        }

        std::fs::write(&self.path, report.to_junit_xml())
            .with_context(|| format!("Failed to write `{}`", self.path))?;

        tracing::debug!(path = %self.path, "Wrote JUnit report");
        Ok(())
    }
}
