use std::num::NonZeroUsize;

/// Names of the environment variables read by fanout.
pub struct EnvVars;

impl EnvVars {
    /// Overrides the log filter installed by `setup_tracing`.
    pub const FANOUT_LOG: &'static str = "FANOUT_LOG";

    /// When set, a flamegraph-compatible trace is written to this path.
    pub const FANOUT_LOG_PROFILE: &'static str = "FANOUT_LOG_PROFILE";

    /// Caps the default number of worker processes.
    pub const FANOUT_MAX_PARALLELISM: &'static str = "FANOUT_MAX_PARALLELISM";

    /// Path to the `fanout_worker` executable.
    pub const FANOUT_WORKER_BINARY: &'static str = "FANOUT_WORKER_BINARY";

    /// Path to a configuration file, equivalent to `--config-file`.
    pub const FANOUT_CONFIG_FILE: &'static str = "FANOUT_CONFIG_FILE";

    /// Active Python virtual environment.
    pub const VIRTUAL_ENV: &'static str = "VIRTUAL_ENV";
}

/// Returns the default number of workers: the host's available parallelism,
/// capped by `FANOUT_MAX_PARALLELISM` when that is set to a positive integer.
pub fn max_parallelism() -> NonZeroUsize {
    let available = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);

    std::env::var(EnvVars::FANOUT_MAX_PARALLELISM)
        .ok()
        .and_then(|value| value.parse::<NonZeroUsize>().ok())
        .map_or(available, |cap| cap.min(available))
}
