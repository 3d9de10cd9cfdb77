mod framework;
mod orchestration;
mod partition;
mod plugins;
mod pool;
pub mod protocol;
mod sequential;
mod shutdown;

pub use framework::{DiscoveryRequest, RecordedRun, TestFramework, assign_outcomes, run_units};
pub use orchestration::{
    CoverageReport, RunConfig, RunResult, collect, execute, find_worker_binary,
};
pub use partition::ExecutionPlan;
pub use plugins::{JunitReporter, NameFilter, Plugin, PluginList};
pub use pool::{PoolError, Ticket, WorkerCommand, WorkerPool};
pub use sequential::run_sequential;
pub use shutdown::shutdown_receiver;
