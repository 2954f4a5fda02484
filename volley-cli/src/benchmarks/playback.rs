//! Replays a dataset of raw signed transactions against the target.
use serde_json::json;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use volley::prelude::*;

pub const DATASET_PARAM: &str = "playback.dataset";
pub const TRANSACTIONS_PARAM: &str = "playback.transactions";
pub const DEFAULT_TRANSACTIONS: usize = 10_000;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Dataset filename not specified (-p {DATASET_PARAM}=<file>)")]
    MissingDataset,

    #[error("Invalid {TRANSACTIONS_PARAM} value: {0}")]
    InvalidLimit(String),

    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Line {line} of the dataset is not a hex encoded transaction")]
    InvalidTransaction { line: usize },

    #[error("Exhausted all transactions, add more transactions")]
    Exhausted,
}

type Queue = VecDeque<String>;

pub struct Playback;

#[async_trait]
impl Benchmark for Playback {
    fn name(&self) -> &str {
        "playback"
    }

    async fn scenario(
        &self,
        _cancel: &CancellationToken,
        state: &mut WorkerState,
    ) -> Result<u64, ScenarioError> {
        let txn = state
            .state_mut::<Queue>()?
            .pop_front()
            .ok_or_else(|| ScenarioError::failed(PlaybackError::Exhausted))?;

        // The remote verdict is not counted; a rejected transaction still exercised the target.
        let connection = state.connection().clone();
        let res = connection
            .call("eth_sendRawTransaction", json!([txn]))
            .await;
        if state.config().verbose() {
            debug!(result = ?res);
        }
        Ok(1)
    }

    fn as_bulk_prepare(&self) -> Option<&dyn BulkPrepare> {
        Some(self)
    }

    fn as_cleanup(&self) -> Option<&dyn Cleanup> {
        Some(self)
    }
}

#[async_trait]
impl BulkPrepare for Playback {
    async fn bulk_prepare(
        &self,
        _cancel: &CancellationToken,
        states: &mut [WorkerState],
    ) -> Result<(), BoxError> {
        let (path, limit) = {
            let Some(first) = states.first() else {
                return Ok(());
            };
            let config = first.config();
            let path = config.param(DATASET_PARAM).ok_or(PlaybackError::MissingDataset)?;
            let limit = match config.param(TRANSACTIONS_PARAM) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| PlaybackError::InvalidLimit(raw.to_string()))?,
                None => DEFAULT_TRANSACTIONS,
            };
            (PathBuf::from(path), limit)
        };

        info!("Parsing dataset");
        let txns = load_dataset(&path, limit).await?;
        info!(num_txns = txns.len(), "Loaded transactions from dataset");

        distribute(txns, states);
        Ok(())
    }
}

#[async_trait]
impl Cleanup for Playback {
    async fn cleanup(&self, state: &mut WorkerState) -> Result<(), BoxError> {
        if let Some(left) = state.take_state::<Queue>() {
            debug!(unsent = left.len(), "Dropping remaining transactions");
        }
        Ok(())
    }
}

#[benchmark]
fn playback() -> Playback {
    Playback
}

/// Reads up to `limit` transactions (0 = all), one hex string per line.
///
/// Blank lines and lines starting with `#` are skipped. Entries are normalized to lowercase
/// with a `0x` prefix.
pub async fn load_dataset(path: &Path, limit: usize) -> Result<Vec<String>, PlaybackError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PlaybackError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let limit = if limit == 0 { usize::MAX } else { limit };
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .take(limit)
        .map(|(line, txn)| normalize(txn).ok_or(PlaybackError::InvalidTransaction { line }))
        .collect()
}

fn normalize(txn: &str) -> Option<String> {
    let digits = txn
        .strip_prefix("0x")
        .or_else(|| txn.strip_prefix("0X"))
        .unwrap_or(txn);
    let valid = !digits.is_empty()
        && digits.len() % 2 == 0
        && digits.chars().all(|c| c.is_ascii_hexdigit());
    valid.then(|| format!("0x{}", digits.to_ascii_lowercase()))
}

/// Deals transactions round-robin into one queue per worker.
fn distribute(txns: Vec<String>, states: &mut [WorkerState]) {
    let workers = states.len();
    let mut queues = vec![Queue::new(); workers];
    for (idx, txn) in txns.into_iter().enumerate() {
        queues[idx % workers].push_back(txn);
    }
    for (state, queue) in states.iter_mut().zip(queues) {
        state.set_state(queue);
    }
}
