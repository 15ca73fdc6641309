//! # Manole Protocol
//!
//! Line-delimited JSON framing between the Manole core and its host
//! shell (Electron/React, or any other client speaking the same
//! stdio contract).
//!
//! ## Shape
//!
//! ```text
//! stdin  : {"id": 1, "method": "query", "params": {...}}\n
//! stdout : {"id": 1, "type": "result", "data": {...}}\n
//! stdout : {"id": null, "type": "status", "data": {...}}\n   (unsolicited)
//! ```
//!
//! Every outbound line is followed by a flush. Non-protocol stdout is a
//! protocol violation — all diagnostic output belongs on stderr.

mod error;
mod event;

pub use error::ProtocolError;
pub use event::{EventType, OutboundFrame};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single inbound line: `{id, method, params}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub id: i64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Parse one inbound line. Returns `Err` (never panics) on malformed
/// JSON or a missing `method` field, per spec.md §6: "Input validation:
/// missing `method` → error event with `id: null`; invalid JSON line →
/// same."
pub fn parse_request(line: &str) -> Result<Request, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::InvalidRequest("empty line".to_string()));
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| ProtocolError::InvalidRequest(format!("invalid JSON: {e}")))?;

    if value.get("method").and_then(Value::as_str).is_none() {
        return Err(ProtocolError::InvalidRequest(
            "missing \"method\" field".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| ProtocolError::InvalidRequest(format!("malformed request: {e}")))
}

/// Serialize one outbound frame as a single NDJSON line (no trailing
/// newline — the writer appends it).
pub fn serialize_frame(frame: &OutboundFrame) -> Result<String, ProtocolError> {
    serde_json::to_string(frame).map_err(|e| ProtocolError::Encode(e.to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    pub message: String,
}
