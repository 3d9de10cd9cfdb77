use std::collections::BTreeMap;

use anyhow::Context;
use camino::Utf8PathBuf;
use fanout_coverage::{FileHits, Instrumentation};
use pyo3::prelude::*;

type RawHits = BTreeMap<String, BTreeMap<u32, u64>>;

/// Line coverage through the interpreter's trace hook.
///
/// Only files under `root` are counted. The hook is per thread, so `start`
/// and `stop` must be called on the thread that runs the tests.
pub struct PythonTracer {
    shim: Py<PyModule>,
    root: Utf8PathBuf,
    counter: Option<Py<PyAny>>,
}

impl PythonTracer {
    pub(crate) const fn new(shim: Py<PyModule>, root: Utf8PathBuf) -> Self {
        Self {
            shim,
            root,
            counter: None,
        }
    }
}

impl Instrumentation for PythonTracer {
    fn start(&mut self) -> anyhow::Result<()> {
        let counter = Python::attach(|py| -> PyResult<Py<PyAny>> {
            let counter = self
                .shim
                .bind(py)
                .call_method1("LineCounter", (self.root.as_str(),))?;
            counter.call_method0("start")?;
            Ok(counter.unbind())
        })?;

        self.counter = Some(counter);
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<FileHits> {
        let counter = self.counter.take().context("Coverage was never started")?;

        let hits = Python::attach(|py| -> PyResult<RawHits> {
            counter.bind(py).call_method0("stop")?.extract()
        })?;

        Ok(hits
            .into_iter()
            .map(|(path, lines)| (Utf8PathBuf::from(path), lines))
            .collect())
    }
}
