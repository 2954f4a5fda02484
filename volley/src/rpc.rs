//! JSON-RPC 2.0 over HTTP, the default wire protocol of the engine.
use crate::connection::{Connection, Connector};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;
use url::Url;
use volley_core::{BoxError, ScenarioError};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Malformed JSON-RPC response: {0}")]
    Malformed(String),

    #[error("Connection is closed")]
    Closed,
}

impl From<RpcError> for ScenarioError {
    fn from(err: RpcError) -> Self {
        ScenarioError::failed(err)
    }
}

/// Dials an [`RpcClient`] per worker.
#[derive(Debug, Clone)]
pub struct RpcConnector {
    timeout: Duration,
}

impl RpcConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RpcConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Connector for RpcConnector {
    async fn connect(&self, endpoint: &Url) -> Result<Arc<dyn Connection>, BoxError> {
        Ok(Arc::new(RpcClient::dial(endpoint, self.timeout)?))
    }
}

/// A single worker's JSON-RPC client.
#[derive(Debug)]
pub struct RpcClient {
    endpoint: Url,
    http: reqwest::Client,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl RpcClient {
    pub fn dial(endpoint: &Url, timeout: Duration) -> Result<Self, RpcError> {
        match endpoint.scheme() {
            "http" | "https" => {}
            other => return Err(RpcError::UnsupportedScheme(other.to_string())),
        }

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(1)
            .tcp_nodelay(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            endpoint: endpoint.clone(),
            http,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RpcError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(id, method, "JSON-RPC request");

        let response: Response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.id != id {
            return Err(RpcError::Malformed(format!(
                "expected response id {id}, got {}",
                response.id
            )));
        }
        match response.error {
            Some(err) => Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            }),
            None => Ok(response.result),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Connection for RpcClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, BoxError> {
        Ok(self.request(method, params).await?)
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}
