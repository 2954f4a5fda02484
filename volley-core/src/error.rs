use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error payload returned by benchmark hooks and connections.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Endpoint {0} has no host")]
    MissingHost(String),

    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Run duration must be greater than zero")]
    ZeroDuration,

    #[error("Run duration {0:?} is shorter than the minimum of {:?}", crate::MIN_DURATION)]
    DurationTooShort(Duration),

    #[error("Benchmark already registered: {0}")]
    DuplicateBenchmark(String),

    #[error("Unknown benchmark: '{0}'")]
    UnknownBenchmark(String),
}

/// Where in setup a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Connect,
    Prepare,
    BulkPrepare,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            SetupStage::Connect => "connect",
            SetupStage::Prepare => "prepare",
            SetupStage::BulkPrepare => "bulk prepare",
        };
        f.write_str(stage)
    }
}

/// The single authoritative outcome of a failed run.
#[derive(Debug, Error)]
pub enum VolleyError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Setup failed during {stage}: {source}")]
    Setup {
        stage: SetupStage,
        #[source]
        source: BoxError,
    },

    #[error("Iteration failed: {0}")]
    Operation(#[source] BoxError),

    #[error("Run canceled")]
    Canceled,
}

impl VolleyError {
    pub fn setup(stage: SetupStage, source: impl Into<BoxError>) -> Self {
        Self::Setup {
            stage,
            source: source.into(),
        }
    }

    /// User-requested stops should not be escalated like failures.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Outcome of a single failed scenario iteration.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Interrupted by run cancellation. Treated as a clean stop.
    #[error("Iteration canceled")]
    Canceled,

    #[error(transparent)]
    Failed(BoxError),
}

impl ScenarioError {
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }
}

impl From<ScenarioError> for VolleyError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::Canceled => VolleyError::Canceled,
            ScenarioError::Failed(err) => VolleyError::Operation(err),
        }
    }
}

/// Teardown failures. Only ever logged; they never replace a run's outcome.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Bulk cleanup failed: {0}")]
    Bulk(#[source] BoxError),

    #[error("Cleanup of worker {id} failed: {source}")]
    Worker {
        id: usize,
        #[source]
        source: BoxError,
    },

    #[error("Closing connection of worker {id} failed: {source}")]
    Close {
        id: usize,
        #[source]
        source: BoxError,
    },

    #[error("Teardown did not finish within {0:?}")]
    Timeout(Duration),
}
