//! A tiny JSON-RPC target for exercising the engine without a real node.
use axum::{
    debug_handler,
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lazy_static::lazy_static;
use metrics::counter;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const FAIL_CODE: i64 = -32000;

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Clone, Default)]
struct Chain {
    calls: Arc<AtomicU64>,
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(rpc))
        .route("/limited/:tps", post(limited))
        .route("/fail", post(fail))
        .layer(TraceLayer::new_for_http())
        .with_state(Chain::default())
}

/// Serves on `addr` until the task is dropped.
pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Mock JSON-RPC service listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Serves on an ephemeral local port in a background task and returns its address.
pub async fn spawn() -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router()).await {
            tracing::error!("Mock JSON-RPC service stopped: {err}");
        }
    });
    debug!("Mock JSON-RPC service spawned on {addr}");
    Ok(addr)
}

#[debug_handler]
async fn rpc(State(chain): State<Chain>, Json(req): Json<Request>) -> Json<Value> {
    counter!("mock_rpc_requests").increment(1);
    Json(answer(&chain, req))
}

lazy_static! {
    static ref LIMITERS: RwLock<HashMap<u32, Arc<DefaultDirectRateLimiter>>> =
        RwLock::new(HashMap::new());
}

#[debug_handler]
async fn limited(
    Path(tps): Path<u32>,
    State(chain): State<Chain>,
    Json(req): Json<Request>,
) -> Json<Value> {
    counter!("mock_rpc_requests").increment(1);
    if let Some(limiter) = limiter(tps) {
        limiter.until_ready().await;
    }
    Json(answer(&chain, req))
}

#[debug_handler]
async fn fail(Json(req): Json<Request>) -> Json<Value> {
    counter!("mock_rpc_failures").increment(1);
    Json(error(req.id, FAIL_CODE, "request failed on purpose"))
}

fn answer(chain: &Chain, req: Request) -> Value {
    let block = chain.calls.fetch_add(1, Ordering::Relaxed) + 1;
    let result = match req.method.as_str() {
        "eth_blockNumber" => json!(format!("{block:#x}")),
        "net_version" => json!("1337"),
        "eth_getBlockByNumber" => json!({
            "number": format!("{block:#x}"),
            "hash": format!("0x{block:064x}"),
            "transactions": [],
        }),
        "eth_sendRawTransaction" => {
            let raw = req.params.get(0).and_then(Value::as_str).unwrap_or_default();
            json!(format!("0x{:064x}", raw.len() as u64 ^ block))
        }
        other => {
            return error(
                req.id,
                METHOD_NOT_FOUND,
                &format!("the method {other} does not exist/is not available"),
            )
        }
    };
    json!({ "jsonrpc": "2.0", "id": req.id, "result": result })
}

fn error(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

fn limiter(tps: u32) -> Option<Arc<DefaultDirectRateLimiter>> {
    let tps = NonZeroU32::new(tps)?;
    if let Some(limiter) = LIMITERS.read().ok()?.get(&tps.get()) {
        return Some(limiter.clone());
    }
    let mut limiters = LIMITERS.write().ok()?;
    let limiter = limiters
        .entry(tps.get())
        .or_insert_with(|| Arc::new(RateLimiter::direct(Quota::per_second(tps))));
    Some(limiter.clone())
}
