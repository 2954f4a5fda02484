use std::time::Duration;

/// Endpoint used when none is supplied.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8545";

pub const DEFAULT_CONCURRENCY: usize = 1;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);

/// Shortest run whose ramp-up, measurement and ramp-down phases are all non-zero.
pub const MIN_DURATION: Duration = Duration::from_nanos(10);

/// Default maximum iterations per second, per worker.
pub const DEFAULT_RATE: u32 = 1;

/// Upper bound on how long bulk and per-worker cleanup may take.
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Tenths of the run discarded at each end of the measurement window.
pub const RAMP_TENTHS: u32 = 1;

/// Tenths of the run that are measured.
pub const MEASUREMENT_TENTHS: u32 = 8;

/// Prefix for every gauge emitted after a run.
pub const METRIC_PREFIX: &str = "volley_";
