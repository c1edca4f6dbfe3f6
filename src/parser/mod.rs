//! Trace payload parser
//!
//! This module turns a trace payload into a validated [`Trace`]:
//! - [`ingest`]: Source normalization (file, data-URI, JSON text, parsed value → JSON value)
//! - [`decode`]: Step, frame, value and heap-object decoding
//!
//! # Payload Shape
//!
//! A payload is either `{ "code": "...", "trace": [step, ...] }` or a bare
//! array of steps. Each step follows the wire format emitted by the tracers:
//!
//! ```text
//! { "event": "step_line", "line": 4, "func_name": "main",
//!   "stack_to_render": [{ "func_name": "main", "encoded_locals": {...},
//!                         "ordered_varnames": [...] }],
//!   "globals": {...}, "ordered_globals": [...],
//!   "heap": { "12": ["LIST", 1, ["REF", 13]] },
//!   "stdout": "..." }
//! ```
//!
//! # Cleanup
//!
//! Tracers keep recording runtime shutdown after `main` returns. Those steps
//! are not part of the user's program and are dropped before decoding.

pub mod decode;
pub mod ingest;

use crate::errors::{Result, VisualizerError};
use crate::snapshot::Trace;
use serde_json::Value as Json;
use tracing::debug;

/// Decode and validate a trace payload
pub fn load(payload: Json) -> Result<Trace> {
    let (code, mut raw_steps) = split_payload(payload)?;

    if raw_steps.is_empty() {
        return Err(VisualizerError::malformed("trace has no steps"));
    }

    if let Some(end) = main_return_index(&raw_steps) {
        if end + 1 < raw_steps.len() {
            debug!(
                kept = end + 1,
                dropped = raw_steps.len() - end - 1,
                "discarding steps recorded after main returned"
            );
            raw_steps.truncate(end + 1);
        }
    }

    let steps = raw_steps
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            decode::decode_step(raw)
                .map_err(|reason| VisualizerError::malformed(format!("step {}: {}", index, reason)))
        })
        .collect::<Result<Vec<_>>>()?;

    let trace = Trace::new(steps, code)?;
    debug!(
        steps = trace.len(),
        failed = trace.is_failed(),
        "trace loaded"
    );
    Ok(trace)
}

fn split_payload(payload: Json) -> Result<(Option<String>, Vec<Json>)> {
    match payload {
        Json::Array(steps) => Ok((None, steps)),
        Json::Object(mut map) => {
            let steps = match map.remove("trace") {
                Some(Json::Array(steps)) => steps,
                Some(_) => return Err(VisualizerError::malformed("`trace` must be an array")),
                None => {
                    return Err(VisualizerError::malformed(
                        "payload has no `trace` array",
                    ))
                }
            };
            let code = match map.remove("code") {
                Some(Json::String(code)) => Some(code),
                Some(Json::Null) | None => None,
                Some(_) => return Err(VisualizerError::malformed("`code` must be a string")),
            };
            Ok((code, steps))
        }
        _ => Err(VisualizerError::malformed(
            "payload must be an object or an array of steps",
        )),
    }
}

/// Index of the first `return` event out of `main`
fn main_return_index(steps: &[Json]) -> Option<usize> {
    steps.iter().position(|step| {
        step.get("event").and_then(Json::as_str) == Some("return")
            && step.get("func_name").and_then(Json::as_str) == Some("main")
    })
}
