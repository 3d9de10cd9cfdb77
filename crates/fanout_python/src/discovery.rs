use fanout_collector::{DiscoveredClass, DiscoveredMethod, DiscoveredModule};
use fanout_runner::DiscoveryRequest;
use pyo3::prelude::*;

type RawMethod = (String, Vec<String>);
type RawClass = (String, bool, Vec<String>, Vec<RawMethod>);
type RawModule = (String, bool, Option<String>, Vec<RawClass>);

/// Runs `unittest` discovery and converts the suite into discovered modules.
///
/// Modules that fail to import come back as failed entries at the position
/// the loader reported them. Each class and method carries the requested
/// attributes it sets to a truthy value.
pub(crate) fn discover(
    shim: &Bound<'_, PyModule>,
    request: &DiscoveryRequest,
) -> PyResult<Vec<DiscoveredModule>> {
    let raw: Vec<RawModule> = shim
        .call_method1(
            "discover",
            (
                request.start_dir.as_str(),
                request.pattern.as_str(),
                request.top_level_dir.as_str(),
                request.attributes.clone(),
            ),
        )?
        .extract()?;

    tracing::debug!(modules = raw.len(), "Discovered test modules");

    Ok(raw.into_iter().map(into_module).collect())
}

fn into_module((name, sequential, error, classes): RawModule) -> DiscoveredModule {
    if let Some(detail) = error {
        return DiscoveredModule::failed(name, detail);
    }

    DiscoveredModule::loaded(
        name,
        sequential,
        classes
            .into_iter()
            .map(|(name, sequential, attributes, methods)| {
                let methods = methods.into_iter().map(|(name, attributes)| {
                    DiscoveredMethod::new(name).with_attributes(attributes)
                });
                DiscoveredClass::new(name, sequential, methods).with_attributes(attributes)
            })
            .collect(),
    )
}
