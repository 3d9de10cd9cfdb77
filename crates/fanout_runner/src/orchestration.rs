use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use camino::Utf8PathBuf;
use crossbeam_channel::never;
use fanout_collector::SuiteTree;
use fanout_coverage::{
    CoverageRun, CoverageSet, CoverageSummary, Instrumentation, SliceId, with_instrumentation,
    write_combined,
};
use fanout_metadata::Settings;
use fanout_report::{Aggregator, Report};
use fanout_static::EnvVars;

use crate::framework::{DiscoveryRequest, TestFramework};
use crate::partition::ExecutionPlan;
use crate::plugins::PluginList;
use crate::pool::{WorkerCommand, WorkerPool};
use crate::sequential::run_sequential;
use crate::shutdown::shutdown_receiver;

const WORKER_BINARY_NAME: &str = "fanout_worker";

/// How the run talks to the world outside the test suite.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The worker process command; `--coverage-dir` is appended when
    /// coverage is enabled.
    pub worker: WorkerCommand,

    /// Install a Ctrl-C handler that cancels the run.
    pub create_ctrlc_handler: bool,
}

/// Merged coverage data and where it was written.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    pub set: CoverageSet,
    pub summary: CoverageSummary,
    pub data_file: Utf8PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub report: Report,
    pub coverage: Option<CoverageReport>,
}

/// Discovers the suite and applies plugin filtering.
///
/// A start directory that cannot be read becomes a single discovery
/// failure rather than an error.
pub fn collect(
    framework: &dyn TestFramework,
    settings: &Settings,
    plugins: &mut PluginList,
) -> anyhow::Result<SuiteTree> {
    tracing::debug!(plugins = ?plugins.names().collect::<Vec<_>>(), "Enabled plugins");
    plugins.pre_discovery(settings)?;

    let request = DiscoveryRequest {
        start_dir: settings.start_dir.clone(),
        pattern: settings.pattern.clone(),
        top_level_dir: settings.top_level_dir.clone(),
        attributes: settings.attributes.clone(),
    };

    let mut tree = if settings.start_dir.is_dir() {
        match framework.discover(&request) {
            Ok(modules) => SuiteTree::from_discovery(modules),
            Err(err) => SuiteTree::unreadable_root(&settings.start_dir, format!("{err:#}")),
        }
    } else {
        SuiteTree::unreadable_root(
            &settings.start_dir,
            format!("`{}` is not a directory", settings.start_dir),
        )
    };

    tree.retain(|unit| plugins.accepts(unit));
    plugins.post_discovery(&tree)?;

    Ok(tree)
}

/// Runs a whole suite: discovery, partitioning, parallel and sequential
/// execution, coverage merging and report assembly.
///
/// Test failures are part of the returned report. Errors are reserved for
/// problems that prevent a report altogether, such as not being able to
/// start a single worker.
pub fn execute(
    framework: &dyn TestFramework,
    instrumentation: &mut dyn Instrumentation,
    settings: &Settings,
    plugins: &mut PluginList,
    config: &RunConfig,
) -> anyhow::Result<RunResult> {
    let tree = collect(framework, settings, plugins)?;
    let plan = ExecutionPlan::from_tree(&tree);

    let coverage_run = if settings.enable_coverage {
        CoverageRun::create(&settings.cache_dir)
            .inspect_err(|err| tracing::warn!("Coverage disabled: {err}"))
            .ok()
    } else {
        None
    };

    let mut aggregator = Aggregator::new(&tree);

    let mut pool = if plan.parallel().is_empty() {
        None
    } else {
        let worker_count = settings.worker_count.min(plan.parallel().len());
        let mut command = config.worker.clone();
        if let Some(run) = &coverage_run {
            command = command.arg("--coverage-dir").arg(run.slice_dir());
        }

        tracing::debug!(workers = worker_count, "Starting workers");
        Some(WorkerPool::start(worker_count, &command).context("Failed to start test workers")?)
    };

    let mut tickets = HashMap::new();
    if let Some(pool) = &mut pool {
        for unit in plan.parallel() {
            tickets.insert(pool.submit(unit.id().clone()), unit.index());
        }
    }

    let sequential = match &coverage_run {
        Some(run) => with_instrumentation(
            instrumentation,
            SliceId::sequential(),
            run.slice_dir(),
            || run_sequential(framework, plan.sequential()),
        ),
        None => run_sequential(framework, plan.sequential()),
    };
    for (index, outcome) in sequential {
        aggregator.record(index, outcome);
    }

    if let Some(mut pool) = pool {
        let interrupt = if config.create_ctrlc_handler {
            shutdown_receiver()
        } else {
            never()
        };

        for (ticket, outcome) in pool.drain(&interrupt) {
            match tickets.get(&ticket) {
                Some(&index) => aggregator.record(index, outcome),
                None => tracing::warn!(?ticket, "Outcome for an unknown ticket"),
            }
        }
        pool.shutdown();
    }

    let coverage = coverage_run.and_then(|run| merge_coverage(run, settings));

    let report = aggregator.finish();
    plugins.report(&report)?;

    Ok(RunResult { report, coverage })
}

fn merge_coverage(run: CoverageRun, settings: &Settings) -> Option<CoverageReport> {
    let merged = run.collect().and_then(|set| {
        let data_file = write_combined(&settings.cache_dir, &set)?;
        Ok((set, data_file))
    });
    run.remove();

    match merged {
        Ok((set, data_file)) => {
            if set.is_empty() {
                tracing::warn!("No lines under `{}` were executed", settings.top_level_dir);
            }
            tracing::debug!(path = %data_file, slices = set.slices().count(), "Wrote combined coverage");
            Some(CoverageReport {
                summary: CoverageSummary::new(&set, &settings.top_level_dir),
                set,
                data_file,
            })
        }
        Err(err) => {
            tracing::warn!("Failed to merge coverage: {err}");
            None
        }
    }
}

/// Finds the `fanout_worker` executable: `FANOUT_WORKER_BINARY`, then next
/// to the current executable, then on `PATH`.
pub fn find_worker_binary() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os(EnvVars::FANOUT_WORKER_BINARY) {
        return Ok(PathBuf::from(path));
    }

    let file_name = format!("{WORKER_BINARY_NAME}{}", std::env::consts::EXE_SUFFIX);
    if let Some(sibling) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .filter(|path| path.is_file())
    {
        return Ok(sibling);
    }

    which::which(WORKER_BINARY_NAME).with_context(|| {
        format!(
            "Could not find `{WORKER_BINARY_NAME}`; set `{}` to its path",
            EnvVars::FANOUT_WORKER_BINARY
        )
    })
}
