use std::fmt;
use std::time::{Duration, Instant};

/// A `(timestamp, counter)` pair taken at a phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub at: Instant,
    pub count: u64,
}

impl Sample {
    pub fn new(at: Instant, count: u64) -> Self {
        Self { at, count }
    }
}

/// Iterations completed between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStats {
    pub start: Instant,
    pub end: Instant,
    pub count: u64,
}

impl PhaseStats {
    pub fn between(before: Sample, after: Sample) -> Self {
        debug_assert!(after.count >= before.count);
        Self {
            start: before.at,
            end: after.at,
            count: after.count.saturating_sub(before.count),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }

    /// Whole milliseconds, as exported in the `_mid_dur_ms` gauge.
    pub fn duration_ms(&self) -> u64 {
        self.duration().as_millis() as u64
    }

    /// Iterations per second.
    pub fn throughput(&self) -> f64 {
        self.count as f64 / self.duration().as_secs_f64()
    }

    /// Average milliseconds per iteration.
    pub fn throughput_inverse(&self) -> f64 {
        self.duration_ms() as f64 / self.count as f64
    }
}

impl fmt::Display for PhaseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "calls={}, duration={}, calls_per_sec={:.2}",
            self.count,
            humantime::format_duration(self.duration()),
            self.throughput(),
        )
    }
}

/// Aggregated output of one run.
///
/// Only `measurement` is authoritative. The ramp phases and the total are informational.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunResult {
    pub ramp_up: PhaseStats,
    pub measurement: PhaseStats,
    pub ramp_down: PhaseStats,
    pub total: PhaseStats,
    /// Counter value once every worker has exited.
    pub completed: u64,
}

impl RunResult {
    pub fn from_samples(
        start: Sample,
        measure_start: Sample,
        measure_end: Sample,
        end: Sample,
        completed: u64,
    ) -> Self {
        Self {
            ramp_up: PhaseStats::between(start, measure_start),
            measurement: PhaseStats::between(measure_start, measure_end),
            ramp_down: PhaseStats::between(measure_end, end),
            total: PhaseStats::between(start, end),
            completed,
        }
    }

    pub fn throughput(&self) -> f64 {
        self.measurement.throughput()
    }

    pub fn throughput_inverse(&self) -> f64 {
        self.measurement.throughput_inverse()
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "measurement: {}", self.measurement)?;
        writeln!(f, "ramp-up:     {}", self.ramp_up)?;
        writeln!(f, "ramp-down:   {}", self.ramp_down)?;
        write!(f, "overall:     {}", self.total)
    }
}
