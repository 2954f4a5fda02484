use super::pacer::Pacer;
use crate::benchmark::Benchmark;
use crate::state::WorkerState;
use async_channel::{Receiver, Sender};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, Instrument};
use volley_core::{BoxError, IterationCounter, ScenarioError};

/// The running workers of one benchmark run.
///
/// Dropping the pool signals every worker to stop but does not wait for them; call
/// [`WorkerPool::halt`] to get the states back.
pub(crate) struct WorkerPool {
    stop: CancellationToken,
    handles: Option<Vec<JoinHandle<WorkerState>>>,
}

impl WorkerPool {
    /// Spawns one worker per state. The receiver yields the first iteration error.
    pub fn spawn(
        benchmark: Arc<dyn Benchmark>,
        states: impl IntoIterator<Item = WorkerState>,
        counter: Arc<IterationCounter>,
        cancel: &CancellationToken,
        interval: Option<Duration>,
    ) -> (Self, Receiver<BoxError>) {
        // Cancelling the run also stops the pool.
        let stop = cancel.child_token();
        let (errors_tx, errors_rx) = async_channel::bounded(1);

        let handles = states
            .into_iter()
            .map(|state| {
                let span = state.span().clone();
                let worker = Worker {
                    benchmark: benchmark.clone(),
                    counter: counter.clone(),
                    stop: stop.clone(),
                    cancel: cancel.clone(),
                    errors: errors_tx.clone(),
                    pacer: Pacer::new(interval),
                };
                tokio::spawn(worker.run(state).instrument(span))
            })
            .collect();

        let pool = Self {
            stop,
            handles: Some(handles),
        };
        (pool, errors_rx)
    }

    /// Stops every worker and waits for all of them to exit.
    ///
    /// Only the first call joins; later calls return nothing.
    pub async fn halt(&mut self) -> Vec<WorkerState> {
        let Some(handles) = self.handles.take() else {
            return Vec::new();
        };
        self.stop.cancel();

        let mut states = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(state) => states.push(state),
                // The state went down with the task, so its cleanup and close never run.
                Err(err) => error!("Worker task could not be joined, its state is lost: {err}"),
            }
        }
        states
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

struct Worker {
    benchmark: Arc<dyn Benchmark>,
    counter: Arc<IterationCounter>,
    stop: CancellationToken,
    cancel: CancellationToken,
    errors: Sender<BoxError>,
    pacer: Pacer,
}

impl Worker {
    async fn run(mut self, mut state: WorkerState) -> WorkerState {
        loop {
            if self.stop.is_cancelled() {
                self.log_exit();
                break;
            }

            let iteration = AssertUnwindSafe(self.benchmark.scenario(&self.cancel, &mut state))
                .catch_unwind();
            let res = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ScenarioError::Canceled),
                res = iteration => res.unwrap_or_else(|panic| Err(panicked(panic))),
            };

            match res {
                Ok(iterations) => self.counter.add(iterations),
                Err(ScenarioError::Canceled) => {
                    debug!("Canceled");
                    break;
                }
                Err(ScenarioError::Failed(err)) => {
                    error!("Iteration failed: {err}");
                    // Only the first error is reported; the run is already unwinding otherwise.
                    let _ = self.errors.try_send(err);
                    break;
                }
            }

            tokio::select! {
                _ = self.stop.cancelled() => {}
                _ = self.pacer.wait() => {}
            }
        }
        state
    }

    fn log_exit(&self) {
        if self.cancel.is_cancelled() {
            debug!("Canceled");
        } else {
            debug!("Finished");
        }
    }
}

fn panicked(panic: Box<dyn Any + Send>) -> ScenarioError {
    let msg = panic
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ScenarioError::failed(format!("Scenario panicked: {msg}"))
}
