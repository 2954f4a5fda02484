//! Benchmark suites bundled with the `volley` binary.
//!
//! Every suite registers itself with `#[benchmark]`, so linking this module is enough to make
//! them selectable by name.
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use volley::{BoxError, Connection};

pub mod basic;
pub mod playback;

#[derive(Debug, Error)]
pub enum EthError {
    #[error("Expected a hex quantity, got {0}")]
    InvalidQuantity(Value),

    #[error("Expected a numeric network id, got {0}")]
    InvalidNetworkId(Value),
}

/// Typed Ethereum JSON-RPC calls over a worker's connection.
#[derive(Clone)]
pub struct EthClient {
    connection: Arc<dyn Connection>,
}

impl EthClient {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    pub async fn block_number(&self) -> Result<u64, BoxError> {
        let res = self.connection.call("eth_blockNumber", json!([])).await?;
        Ok(parse_quantity(&res)?)
    }

    pub async fn network_id(&self) -> Result<u64, BoxError> {
        let res = self.connection.call("net_version", json!([])).await?;
        res.as_str()
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| EthError::InvalidNetworkId(res.clone()).into())
    }

    /// The latest block, without full transaction bodies.
    pub async fn latest_block(&self) -> Result<Value, BoxError> {
        self.connection
            .call("eth_getBlockByNumber", json!(["latest", false]))
            .await
    }

    pub async fn send_raw_transaction(&self, raw: &str) -> Result<Value, BoxError> {
        self.connection
            .call("eth_sendRawTransaction", json!([raw]))
            .await
    }
}

/// Parses a `0x`-prefixed hex quantity.
pub fn parse_quantity(value: &Value) -> Result<u64, EthError> {
    value
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .and_then(|digits| u64::from_str_radix(digits, 16).ok())
        .ok_or_else(|| EthError::InvalidQuantity(value.clone()))
}
