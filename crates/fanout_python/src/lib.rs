//! Python `unittest` as a fanout test framework, through an embedded
//! interpreter.
//!
//! Discovery, execution and line tracing are delegated to a small Python
//! module that ships inside this crate; everything crossing into Rust is
//! plain tuples and dicts.

mod discovery;
mod execution;
mod tracer;

use std::ffi::CString;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fanout_collector::{DiscoveredModule, UnitId};
use fanout_runner::{DiscoveryRequest, RecordedRun, TestFramework};
use fanout_static::EnvVars;
use pyo3::prelude::*;

pub use tracer::PythonTracer;

const SHIM_SOURCE: &str = include_str!("shim.py");

pub struct PythonFramework {
    shim: Py<PyModule>,
    top_level_dir: Utf8PathBuf,
}

impl PythonFramework {
    /// Starts the interpreter (once per process) and makes modules under
    /// `top_level_dir`, plus the active virtual environment, importable.
    pub fn new(top_level_dir: &Utf8Path) -> anyhow::Result<Self> {
        Python::initialize();

        let virtual_env = std::env::var(EnvVars::VIRTUAL_ENV).ok();

        Python::attach(|py| {
            let shim = load_shim(py)?;
            shim.call_method1("configure", (top_level_dir.as_str(), virtual_env))
                .context("Failed to configure the Python interpreter")?;

            tracing::debug!(%top_level_dir, "Initialized Python");

            Ok(Self {
                shim: shim.unbind(),
                top_level_dir: top_level_dir.to_path_buf(),
            })
        })
    }

    /// Sends everything Python prints to stderr, leaving stdout to the
    /// worker protocol.
    pub fn route_stdout_to_stderr(&self) -> anyhow::Result<()> {
        Python::attach(|py| {
            self.shim.bind(py).call_method0("route_stdout_to_stderr")?;
            Ok(())
        })
    }

    /// A line tracer counting the files under the top-level directory.
    pub fn tracer(&self) -> PythonTracer {
        let shim = Python::attach(|py| self.shim.clone_ref(py));
        PythonTracer::new(shim, self.top_level_dir.clone())
    }
}

impl TestFramework for PythonFramework {
    fn discover(&self, request: &DiscoveryRequest) -> anyhow::Result<Vec<DiscoveredModule>> {
        Python::attach(|py| {
            discovery::discover(self.shim.bind(py), request)
                .map_err(|err| anyhow::anyhow!(describe(py, &err)))
                .with_context(|| format!("Failed to discover tests in `{}`", request.start_dir))
        })
    }

    fn run(&self, units: &[UnitId]) -> anyhow::Result<Vec<RecordedRun>> {
        Python::attach(|py| execution::run(self.shim.bind(py), units))
    }
}

fn load_shim(py: Python<'_>) -> anyhow::Result<Bound<'_, PyModule>> {
    let code = CString::new(SHIM_SOURCE).context("Embedded Python source contains a nul byte")?;
    PyModule::from_code(py, &code, c"fanout_shim.py", c"_fanout_shim")
        .map_err(|err| anyhow::anyhow!(describe(py, &err)))
        .context("Failed to load the unittest bridge")
}

/// The exception with its traceback, as Python would print it.
fn describe(py: Python<'_>, err: &PyErr) -> String {
    let formatted = py.import("traceback").and_then(|traceback| {
        traceback
            .call_method1(
                "format_exception",
                (err.get_type(py), err.value(py), err.traceback(py)),
            )?
            .extract::<Vec<String>>()
    });

    match formatted {
        Ok(lines) => lines.concat().trim_end().to_string(),
        Err(_) => err.to_string(),
    }
}
