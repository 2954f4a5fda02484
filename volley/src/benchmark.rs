//! The lifecycle contract a pluggable benchmark implements.
//!
//! [`Benchmark`] is mandatory. The four hook traits are optional capabilities; a benchmark opts
//! into one by implementing the trait and returning `Some(self)` from the matching `as_*`
//! accessor. The engine checks each capability before invoking it.
//!
//! Order within a run:
//! 1. [`Prepare::prepare`] once per worker, in worker order.
//! 2. [`BulkPrepare::bulk_prepare`] once, with every worker state.
//! 3. [`Benchmark::scenario`] repeatedly on every worker.
//! 4. [`BulkCleanup::bulk_cleanup`] once, with every state that was constructed.
//! 5. [`Cleanup::cleanup`] once per constructed state, in worker order.
//!
//! Steps 4 and 5 run on every exit path, including failed setup and cancellation.
use crate::state::WorkerState;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use volley_core::{BoxError, ScenarioError};

#[async_trait]
pub trait Benchmark: Send + Sync + 'static {
    /// Stable unique name, used for registration and metric names.
    fn name(&self) -> &str;

    /// Performs one unit of work and returns how many logical operations it represents.
    ///
    /// Return [`ScenarioError::Canceled`] when interrupted by `cancel`; any other error aborts
    /// the run.
    async fn scenario(
        &self,
        cancel: &CancellationToken,
        state: &mut WorkerState,
    ) -> Result<u64, ScenarioError>;

    fn as_prepare(&self) -> Option<&dyn Prepare> {
        None
    }

    fn as_bulk_prepare(&self) -> Option<&dyn BulkPrepare> {
        None
    }

    fn as_cleanup(&self) -> Option<&dyn Cleanup> {
        None
    }

    fn as_bulk_cleanup(&self) -> Option<&dyn BulkCleanup> {
        None
    }
}

/// Per-worker setup, run before any iteration. Failure aborts the run.
#[async_trait]
pub trait Prepare: Send + Sync {
    async fn prepare(
        &self,
        cancel: &CancellationToken,
        state: &mut WorkerState,
    ) -> Result<(), BoxError>;
}

/// Setup that needs the whole pool, run after every [`Prepare`] succeeded.
#[async_trait]
pub trait BulkPrepare: Send + Sync {
    async fn bulk_prepare(
        &self,
        cancel: &CancellationToken,
        states: &mut [WorkerState],
    ) -> Result<(), BoxError>;
}

/// Per-worker teardown, run after the worker stopped. Errors are logged only.
#[async_trait]
pub trait Cleanup: Send + Sync {
    async fn cleanup(&self, state: &mut WorkerState) -> Result<(), BoxError>;
}

/// Teardown across the pool, run before any [`Cleanup`]. Errors are logged only.
#[async_trait]
pub trait BulkCleanup: Send + Sync {
    async fn bulk_cleanup(
        &self,
        cancel: &CancellationToken,
        states: &mut [WorkerState],
    ) -> Result<(), BoxError>;
}
