//! Batch rendering: a JSON array of queries in, one keyed JSON document out.

use std::path::Path;

use futures::stream::{self, StreamExt};
use mathcast_api_types::{BatchEntry, BatchFailure};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::application::render::{MathRenderService, RenderRequest};

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const MAX_CONCURRENCY: usize = 32;

const SUCCESS_KEY: &str = "success";
const NOHASH_KEY: &str = "nohash";

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read batch input: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write batch output: {0}")]
    Write(#[source] std::io::Error),
    #[error("batch input is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("batch input must be a JSON array of queries")]
    NotAnArray,
}

/// Clamp a requested concurrency to `1..=MAX_CONCURRENCY`.
pub fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, MAX_CONCURRENCY)
}

/// Parse the batch document into raw entries. Entries are kept as raw JSON so
/// they can be echoed back unchanged.
pub fn parse_entries(input: &str) -> Result<Vec<Value>, BatchError> {
    match serde_json::from_str::<Value>(input)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(BatchError::NotAnArray),
    }
}

/// Render every entry with at most `concurrency` renders in flight and fold
/// the responses, in input order, into the batch output document.
///
/// Hashed responses are keyed by their hash. A hash equal to one of the
/// document's own keys (`success`, `nohash`) is filed under `nohash` instead.
/// When two entries share a hash the later response wins.
pub async fn render_batch(
    service: &MathRenderService,
    entries: Vec<Value>,
    concurrency: usize,
) -> Value {
    let concurrency = clamp_concurrency(concurrency);
    info!(
        target = "mathcast::batch",
        entries = entries.len(),
        concurrency,
        "Starting batch render"
    );

    let responses: Vec<(Option<String>, Value)> = stream::iter(entries.iter())
        .map(|entry| render_entry(service, entry))
        .buffered(concurrency)
        .collect()
        .await;

    let mut out = Map::new();
    out.insert(SUCCESS_KEY.to_string(), Value::Bool(true));
    let mut nohash = Vec::new();

    for (entry, (hash, response)) in entries.into_iter().zip(responses) {
        match hash {
            Some(hash) if is_reserved_key(&hash) => {
                warn!(
                    target = "mathcast::batch",
                    hash = hash.as_str(),
                    "Batch hash collides with an output key; filing under nohash"
                );
                nohash.push(json!({ "req": entry, "res": response }));
            }
            Some(hash) => {
                out.insert(hash, response);
            }
            None => nohash.push(json!({ "req": entry, "res": response })),
        }
    }

    out.insert(NOHASH_KEY.to_string(), Value::Array(nohash));
    Value::Object(out)
}

fn is_reserved_key(hash: &str) -> bool {
    hash == SUCCESS_KEY || hash == NOHASH_KEY
}

async fn render_entry(service: &MathRenderService, entry: &Value) -> (Option<String>, Value) {
    let query = match serde_json::from_value::<BatchEntry>(entry.clone()) {
        Ok(entry) => entry.query,
        Err(err) => {
            let hash = entry
                .pointer("/query/hash")
                .and_then(Value::as_str)
                .map(str::to_string);
            return (hash, failure(format!("invalid batch entry: {err}")));
        }
    };

    let request = RenderRequest {
        markup: query.q.unwrap_or_default(),
        input_type: query.input_type,
        output_format: query.outformat,
        features: query.features,
    };

    let response = match service.render(request).await {
        Ok(payload) => payload.to_json(),
        Err(err) => {
            debug!(
                target = "mathcast::batch",
                hash = query.hash.as_deref().unwrap_or(""),
                kind = err.kind(),
                "Batch entry failed"
            );
            failure(err.to_string())
        }
    };

    (query.hash, response)
}

fn failure(log: String) -> Value {
    serde_json::to_value(BatchFailure::new(log)).unwrap_or_default()
}

/// Read the batch document from `path`, or stdin when no path is given.
pub async fn read_input(path: Option<&Path>) -> Result<String, BatchError> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(BatchError::Read),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .map_err(BatchError::Read)?;
            Ok(input)
        }
    }
}

/// Write the batch output to `path`, or stdout when no path is given.
pub async fn write_output(path: Option<&Path>, output: &Value) -> Result<(), BatchError> {
    let body = serde_json::to_vec(output)?;
    match path {
        Some(path) => tokio::fs::write(path, body)
            .await
            .map_err(BatchError::Write),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&body).await.map_err(BatchError::Write)?;
            stdout.flush().await.map_err(BatchError::Write)
        }
    }
}
