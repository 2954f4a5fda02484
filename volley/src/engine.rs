//! The execution engine: setup, phased measurement and teardown of one benchmark run.
use crate::benchmark::Benchmark;
use crate::connection::Connector;
use crate::state::WorkerState;
use async_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Instrument};
use volley_core::{
    BoxError, CleanupError, IterationCounter, RunConfig, RunResult, Sample, SetupStage,
    VolleyError,
};
use worker::WorkerPool;

mod pacer;
mod worker;

/// Runs benchmarks against one target with one [`RunConfig`].
#[derive(Clone)]
pub struct Engine {
    config: Arc<RunConfig>,
    connector: Arc<dyn Connector>,
}

impl Engine {
    /// Engine talking JSON-RPC over HTTP to the configured endpoint.
    #[cfg(feature = "rpc")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rpc")))]
    pub fn new(config: RunConfig) -> Self {
        Self::with_connector(config, crate::rpc::RpcConnector::default())
    }

    pub fn with_connector(config: RunConfig, connector: impl Connector + 'static) -> Self {
        Self {
            config: Arc::new(config),
            connector: Arc::new(connector),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs each benchmark in turn.
    ///
    /// Cancellation ends the sequence early and returns the results gathered so far. Any other
    /// failure is returned as is.
    pub async fn run_all(
        &self,
        benchmarks: &[Arc<dyn Benchmark>],
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, RunResult)>, VolleyError> {
        let mut results = Vec::with_capacity(benchmarks.len());
        for benchmark in benchmarks {
            match self.run(benchmark.clone(), cancel).await {
                Ok(result) => results.push((benchmark.name().to_string(), result)),
                Err(VolleyError::Canceled) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(results)
    }

    /// Runs one benchmark to completion.
    ///
    /// Teardown always happens before this returns, whatever the outcome.
    #[instrument(name = "benchmark", skip_all, fields(benchmark = benchmark.name()))]
    pub async fn run(
        &self,
        benchmark: Arc<dyn Benchmark>,
        cancel: &CancellationToken,
    ) -> Result<RunResult, VolleyError> {
        info!("Starting benchmark");

        let mut states = Vec::with_capacity(self.config.concurrency());
        let outcome = self.execute(&benchmark, cancel, &mut states).await;
        self.teardown(&benchmark, &mut states).await;

        match &outcome {
            Ok(result) => {
                report(result);
                #[cfg(feature = "metrics")]
                crate::metrics::record(benchmark.name(), result);
            }
            Err(VolleyError::Canceled) => info!("Benchmark canceled"),
            Err(err) => error!("Benchmark failed: {err}"),
        }
        outcome
    }

    async fn execute(
        &self,
        benchmark: &Arc<dyn Benchmark>,
        cancel: &CancellationToken,
        states: &mut Vec<WorkerState>,
    ) -> Result<RunResult, VolleyError> {
        self.setup(benchmark, cancel, states).await?;
        info!("Preparation done");

        if let Some(bulk) = benchmark.as_bulk_prepare() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(VolleyError::Canceled),
                res = bulk.bulk_prepare(cancel, states) => {
                    res.map_err(|err| VolleyError::setup(SetupStage::BulkPrepare, err))?;
                }
            }
            info!("Bulk preparation done");
        }

        let counter = Arc::new(IterationCounter::new());
        let (mut pool, errors) = WorkerPool::spawn(
            benchmark.clone(),
            states.drain(..),
            counter.clone(),
            cancel,
            self.config.rate_interval(),
        );
        let start = sample(&counter);
        info!("Workers started");

        let measured = self.measure(&counter, cancel, &errors).await;

        states.extend(pool.halt().await);
        let completed = counter.get();
        info!("Workers joined");

        let (measure_start, measure_end, end) = measured?;
        if let Ok(err) = errors.try_recv() {
            warn!("Worker failed after the last phase ended: {err}");
        }

        Ok(RunResult::from_samples(
            start,
            measure_start,
            measure_end,
            end,
            completed,
        ))
    }

    /// Connects and prepares every worker, pushing each fully prepared state.
    async fn setup(
        &self,
        benchmark: &Arc<dyn Benchmark>,
        cancel: &CancellationToken,
        states: &mut Vec<WorkerState>,
    ) -> Result<(), VolleyError> {
        for id in 0..self.config.concurrency() {
            if cancel.is_cancelled() {
                return Err(VolleyError::Canceled);
            }

            let connection = tokio::select! {
                _ = cancel.cancelled() => return Err(VolleyError::Canceled),
                res = self.connector.connect(self.config.endpoint()) => {
                    res.map_err(|err| VolleyError::setup(SetupStage::Connect, err))?
                }
            };
            let mut state = WorkerState::new(id, self.config.clone(), connection);

            if let Some(prepare) = benchmark.as_prepare() {
                let span = state.span().clone();
                let res = tokio::select! {
                    _ = cancel.cancelled() => Err(VolleyError::Canceled),
                    res = prepare.prepare(cancel, &mut state).instrument(span) => {
                        res.map_err(|err| VolleyError::setup(SetupStage::Prepare, err))
                    }
                };
                // A state that failed to prepare is not handed to the cleanup hooks.
                if let Err(err) = res {
                    state.close_connection().await;
                    return Err(err);
                }
            }

            states.push(state);
        }
        Ok(())
    }

    /// Sleeps through the three phases and samples the counter at each boundary.
    async fn measure(
        &self,
        counter: &IterationCounter,
        cancel: &CancellationToken,
        errors: &Receiver<BoxError>,
    ) -> Result<(Sample, Sample, Sample), VolleyError> {
        let (ramp_up, window, ramp_down) = self.config.phases();

        let measure_start = phase(ramp_up, "ramp-up", counter, cancel, errors).await?;
        let measure_end = phase(window, "measurement", counter, cancel, errors).await?;
        let end = phase(ramp_down, "ramp-down", counter, cancel, errors).await?;

        Ok((measure_start, measure_end, end))
    }

    /// Bulk cleanup, then per-worker cleanup and close, for every constructed state.
    ///
    /// Hooks get their own token so a canceled run can still release its resources. All of
    /// teardown shares one deadline; once it passes, remaining cleanup hooks are skipped but
    /// every connection is still closed.
    async fn teardown(&self, benchmark: &Arc<dyn Benchmark>, states: &mut [WorkerState]) {
        let teardown_cancel = CancellationToken::new();
        let timeout = self.config.teardown_timeout();
        let deadline = Instant::now() + timeout;
        let mut expired = false;

        if let Some(bulk) = benchmark.as_bulk_cleanup() {
            match timeout_at(deadline, bulk.bulk_cleanup(&teardown_cancel, states)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("{}", CleanupError::Bulk(err)),
                Err(_) => expired = true,
            }
        }

        for state in states.iter_mut() {
            if let (Some(cleanup), false) = (benchmark.as_cleanup(), expired) {
                let span = state.span().clone();
                match timeout_at(deadline, cleanup.cleanup(state).instrument(span)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(source)) => {
                        error!("{}", CleanupError::Worker { id: state.id(), source })
                    }
                    Err(_) => expired = true,
                }
            }
            // The close future is polled once even past the deadline.
            if timeout_at(deadline, state.close_connection()).await.is_err() {
                expired = true;
            }
        }

        if expired {
            error!("{}", CleanupError::Timeout(timeout));
        }
        debug!("Teardown complete");
    }
}

async fn phase(
    duration: Duration,
    descr: &str,
    counter: &IterationCounter,
    cancel: &CancellationToken,
    errors: &Receiver<BoxError>,
) -> Result<Sample, VolleyError> {
    info!("Begin {descr}");
    tokio::select! {
        _ = cancel.cancelled() => {
            info!("Canceled during {descr}");
            Err(VolleyError::Canceled)
        }
        Ok(err) = errors.recv() => Err(VolleyError::Operation(err)),
        _ = tokio::time::sleep(duration) => Ok(sample(counter)),
    }
}

fn sample(counter: &IterationCounter) -> Sample {
    Sample::new(Instant::now().into_std(), counter.get())
}

fn report(result: &RunResult) {
    let RunResult {
        measurement,
        total,
        ramp_up,
        ramp_down,
        ..
    } = result;
    info!(
        calls = measurement.count,
        duration = ?measurement.duration(),
        calls_per_sec = measurement.throughput(),
        "Middle 80%"
    );
    info!(
        calls = total.count,
        duration = ?total.duration(),
        calls_per_sec = total.throughput(),
        "Overall"
    );
    info!(
        calls = ramp_up.count,
        duration = ?ramp_up.duration(),
        calls_per_sec = ramp_up.throughput(),
        "Ramp-up"
    );
    info!(
        calls = ramp_down.count,
        duration = ?ramp_down.duration(),
        calls_per_sec = ramp_down.throughput(),
        "Ramp-down"
    );
}
