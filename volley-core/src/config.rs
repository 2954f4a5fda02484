use crate::{
    ConfigError, DEFAULT_CONCURRENCY, DEFAULT_DURATION, DEFAULT_RATE, DEFAULT_TEARDOWN_TIMEOUT,
    MEASUREMENT_TENTHS, MIN_DURATION, RAMP_TENTHS,
};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;
use url::Url;

/// Immutable configuration for one benchmark run.
///
/// Built through [`RunConfig::builder`], which validates every field.
#[derive(Clone, Debug)]
pub struct RunConfig {
    endpoint: Url,
    concurrency: NonZeroUsize,
    duration: Duration,
    rate: u32,
    verbose: bool,
    teardown_timeout: Duration,
    params: BTreeMap<String, String>,
}

impl RunConfig {
    pub fn builder(endpoint: &str) -> RunConfigBuilder {
        RunConfigBuilder::new(endpoint)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.get()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Maximum iterations per second for each worker. `0` means unlimited.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn teardown_timeout(&self) -> Duration {
        self.teardown_timeout
    }

    /// Benchmark specific option, e.g. `playback.dataset`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Nominal gap between two iterations of the same worker, if rate limited.
    pub fn rate_interval(&self) -> Option<Duration> {
        (self.rate != 0).then(|| Duration::from_nanos(1_000_000_000 / u64::from(self.rate)))
    }

    /// Durations of the ramp-up, measurement and ramp-down phases.
    pub fn phases(&self) -> (Duration, Duration, Duration) {
        let tenth = self.duration / 10;
        (
            tenth * RAMP_TENTHS,
            tenth * MEASUREMENT_TENTHS,
            tenth * RAMP_TENTHS,
        )
    }
}

#[derive(Clone, Debug)]
pub struct RunConfigBuilder {
    endpoint: String,
    concurrency: usize,
    duration: Duration,
    rate: u32,
    verbose: bool,
    teardown_timeout: Duration,
    params: BTreeMap<String, String>,
}

impl RunConfigBuilder {
    fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            duration: DEFAULT_DURATION,
            rate: DEFAULT_RATE,
            verbose: false,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            params: BTreeMap::new(),
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let endpoint = Url::parse(&self.endpoint)?;
        if endpoint.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingHost(self.endpoint));
        }
        let concurrency =
            NonZeroUsize::new(self.concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if self.duration < MIN_DURATION {
            return Err(ConfigError::DurationTooShort(self.duration));
        }

        Ok(RunConfig {
            endpoint,
            concurrency,
            duration: self.duration,
            rate: self.rate,
            verbose: self.verbose,
            teardown_timeout: self.teardown_timeout,
            params: self.params,
        })
    }
}
