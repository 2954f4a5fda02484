#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod benchmark;
pub mod connection;
pub mod engine;
pub mod registry;
#[cfg(feature = "rpc")]
#[cfg_attr(docsrs, doc(cfg(feature = "rpc")))]
pub mod rpc;
pub mod state;

#[cfg(feature = "metrics")]
mod metrics;

pub use benchmark::{Benchmark, BulkCleanup, BulkPrepare, Cleanup, Prepare};
pub use connection::{Connection, Connector};
pub use engine::Engine;
pub use registry::Registry;
pub use state::{StateError, WorkerState};
pub use volley_macros::benchmark;

#[doc(hidden)]
pub use volley_core as core;

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
pub use volley_core::{
    BoxError, CleanupError, ConfigError, PhaseStats, RunConfig, RunResult, ScenarioError,
    SetupStage, VolleyError,
};

pub mod prelude {
    pub use crate::{
        async_trait, benchmark, Benchmark, BoxError, BulkCleanup, BulkPrepare,
        CancellationToken, Cleanup, Connection, Engine, Prepare, RunConfig, RunResult,
        ScenarioError, VolleyError, WorkerState,
    };
}
