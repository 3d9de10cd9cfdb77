use std::fmt;
use std::fs::File;
use std::io::BufWriter;

use fanout_static::EnvVars;
use tracing_flame::{FlameLayer, FlushGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};
use tracing_tree::HierarchicalLayer;

use crate::VerbosityLevel;

/// Keeps the profiling output flushed until the process is done logging.
#[must_use]
pub struct TracingGuard {
    _flame: Option<FlushGuard<BufWriter<File>>>,
}

/// Installs the global tracing subscriber.
///
/// The filter comes from `FANOUT_LOG` when set, otherwise from the verbosity.
/// At `-vv` and above events are rendered as a span tree; below that a flat
/// format with local timestamps is used. Setting `FANOUT_LOG_PROFILE` adds a
/// flamegraph layer writing folded stacks to that path.
///
/// Installing twice is a no-op, which keeps tests that share a process happy.
pub fn setup_tracing(verbosity: VerbosityLevel) -> TracingGuard {
    let filter = EnvFilter::try_from_env(EnvVars::FANOUT_LOG)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let (flame_layer, flame_guard) = match std::env::var(EnvVars::FANOUT_LOG_PROFILE) {
        Ok(path) => match FlameLayer::with_file(&path) {
            Ok((layer, guard)) => (Some(layer), Some(guard)),
            Err(err) => {
                eprintln!("Failed to create profile output `{path}`: {err}");
                (None, None)
            }
        },
        Err(_) => (None, None),
    };

    let output_layer: Box<dyn Layer<Registry> + Send + Sync> =
        if verbosity >= VerbosityLevel::ExtraVerbose {
            HierarchicalLayer::default()
                .with_indent_lines(true)
                .with_targets(true)
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_target(verbosity >= VerbosityLevel::Verbose)
                .with_writer(std::io::stderr)
                .boxed()
        };

    let _ = tracing_subscriber::registry()
        .with(output_layer)
        .with(filter)
        .with(flame_layer)
        .try_init();

    TracingGuard {
        _flame: flame_guard,
    }
}

/// Wall-clock timestamps in the local timezone.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}
