//! Single-call read benchmarks.
use super::EthClient;
use tracing::debug;
use volley::prelude::*;

pub struct EthBlockNumber;

#[async_trait]
impl Benchmark for EthBlockNumber {
    fn name(&self) -> &str {
        "eth_blockNumber"
    }

    async fn scenario(
        &self,
        _cancel: &CancellationToken,
        state: &mut WorkerState,
    ) -> Result<u64, ScenarioError> {
        let client = EthClient::new(state.connection().clone());
        let number = client.block_number().await.map_err(ScenarioError::Failed)?;
        if state.config().verbose() {
            debug!(result = number);
        }
        Ok(1)
    }
}

#[benchmark]
fn eth_block_number() -> EthBlockNumber {
    EthBlockNumber
}

/// Stores an [`EthClient`] in the worker state during prepare.
struct ClientPerWorker;

#[async_trait]
impl Prepare for ClientPerWorker {
    async fn prepare(
        &self,
        _cancel: &CancellationToken,
        state: &mut WorkerState,
    ) -> Result<(), BoxError> {
        let client = EthClient::new(state.connection().clone());
        state.set_state(client);
        Ok(())
    }
}

#[async_trait]
impl Cleanup for ClientPerWorker {
    async fn cleanup(&self, state: &mut WorkerState) -> Result<(), BoxError> {
        drop(state.take_state::<EthClient>());
        Ok(())
    }
}

pub struct NetVersion;

#[async_trait]
impl Benchmark for NetVersion {
    fn name(&self) -> &str {
        "net_version"
    }

    async fn scenario(
        &self,
        _cancel: &CancellationToken,
        state: &mut WorkerState,
    ) -> Result<u64, ScenarioError> {
        let client = state.state::<EthClient>()?.clone();
        let version = client.network_id().await.map_err(ScenarioError::Failed)?;
        if state.config().verbose() {
            debug!(result = version);
        }
        Ok(1)
    }

    fn as_prepare(&self) -> Option<&dyn Prepare> {
        Some(&ClientPerWorker)
    }

    fn as_cleanup(&self) -> Option<&dyn Cleanup> {
        Some(&ClientPerWorker)
    }
}

#[benchmark]
fn net_version() -> NetVersion {
    NetVersion
}

pub struct EthGetBlockByNumber;

#[async_trait]
impl Benchmark for EthGetBlockByNumber {
    fn name(&self) -> &str {
        "eth_getBlockByNumber"
    }

    async fn scenario(
        &self,
        _cancel: &CancellationToken,
        state: &mut WorkerState,
    ) -> Result<u64, ScenarioError> {
        let client = state.state::<EthClient>()?.clone();
        let block = client.latest_block().await.map_err(ScenarioError::Failed)?;
        if state.config().verbose() {
            debug!(result = %block);
        }
        Ok(1)
    }

    fn as_prepare(&self) -> Option<&dyn Prepare> {
        Some(&ClientPerWorker)
    }

    fn as_cleanup(&self) -> Option<&dyn Cleanup> {
        Some(&ClientPerWorker)
    }
}

#[benchmark]
fn eth_get_block_by_number() -> EthGetBlockByNumber {
    EthGetBlockByNumber
}
