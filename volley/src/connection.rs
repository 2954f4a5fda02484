//! The engine's view of the target service: something that can answer a call and be closed.
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;
use volley_core::BoxError;

/// One worker's connection to the target.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, BoxError>;

    /// Releases the connection. Must be idempotent.
    async fn close(&self) -> Result<(), BoxError>;
}

/// Opens one [`Connection`] per worker during setup.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Url) -> Result<Arc<dyn Connection>, BoxError>;
}
