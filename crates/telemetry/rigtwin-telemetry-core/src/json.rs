//! JSON ingestion for telemetry snapshots and snapshot sequences.
//!
//! Producers send either a single record (`{ ... }`), a bare array of records
//! (`[{ ... }, { ... }]`) or an envelope with a `frames` array. All three are
//! accepted by [`parse_sequence`].

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::TelemetrySnapshot;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("telemetry json parse error: {0}")]
    Parse(String),
    #[error("telemetry record must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("telemetry frame {index}: {message}")]
    Frame { index: usize, message: String },
}

fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Convert an already-parsed JSON value into a snapshot. The top level must be an object.
pub fn snapshot_from_value(value: JsonValue) -> Result<TelemetrySnapshot, JsonError> {
    if !value.is_object() {
        return Err(JsonError::NotAnObject(json_kind(&value)));
    }
    serde_json::from_value(value).map_err(|e| JsonError::Parse(e.to_string()))
}

/// Parse one snapshot from JSON text.
pub fn parse_snapshot(text: &str) -> Result<TelemetrySnapshot, JsonError> {
    let value: JsonValue = serde_json::from_str(text).map_err(|e| JsonError::Parse(e.to_string()))?;
    snapshot_from_value(value)
}

/// Convert a JSON value holding one or more records into an ordered snapshot list.
pub fn sequence_from_value(value: JsonValue) -> Result<Vec<TelemetrySnapshot>, JsonError> {
    let frames = match value {
        JsonValue::Array(items) => items,
        JsonValue::Object(mut obj) => match obj.remove("frames") {
            Some(JsonValue::Array(items)) => items,
            Some(other) => {
                return Err(JsonError::Frame {
                    index: 0,
                    message: format!("'frames' must be an array, found {}", json_kind(&other)),
                })
            }
            None => vec![JsonValue::Object(obj)],
        },
        other => return Err(JsonError::NotAnObject(json_kind(&other))),
    };
    frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| {
            snapshot_from_value(frame).map_err(|e| JsonError::Frame {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Parse a snapshot sequence from JSON text.
pub fn parse_sequence(text: &str) -> Result<Vec<TelemetrySnapshot>, JsonError> {
    let value: JsonValue = serde_json::from_str(text).map_err(|e| JsonError::Parse(e.to_string()))?;
    sequence_from_value(value)
}
