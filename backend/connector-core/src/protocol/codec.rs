//! Array-of-objects framing.

use crate::error::frame::FrameError;
use crate::protocol::ClientMessage;

use common::ErrorLocation;

use std::panic::Location;

use log::warn;
use serde_json::Value;

/// One decoded frame element: its tag and the untouched payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub tag: String,
    pub payload: Value,
}

/// Serialize a single command as a one-element array.
///
/// Outbound messages are never batched, even though the protocol allows it.
///
/// # Errors
///
/// Returns [`FrameError::Encode`] if serialization fails.
#[track_caller]
pub fn encode(message: &ClientMessage) -> Result<String, FrameError> {
    serde_json::to_string(&[message]).map_err(|e| FrameError::Encode {
        message: format!("Failed to encode {}: {e}", message.tag()),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Split a raw text frame into tagged envelopes.
///
/// Elements that are not single-key objects are skipped with a warning so
/// one bad element does not drop its siblings.
///
/// # Errors
///
/// - [`FrameError::MalformedFrame`] if `raw` is not valid JSON
/// - [`FrameError::ProtocolViolation`] if the top-level value is not an array
#[track_caller]
pub fn decode(raw: &str) -> Result<Vec<Envelope>, FrameError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| FrameError::MalformedFrame {
        message: format!("Frame is not valid JSON: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            return Err(FrameError::ProtocolViolation {
                message: format!("Expected a JSON array frame, got {}", value_kind(&other)),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    let mut envelopes = Vec::with_capacity(elements.len());
    for (position, element) in elements.into_iter().enumerate() {
        match element {
            Value::Object(map) if map.len() == 1 => {
                if let Some((tag, payload)) = map.into_iter().next() {
                    envelopes.push(Envelope { tag, payload });
                }
            }
            other => {
                warn!(
                    "Skipping frame element {position}: expected a single-key object, got {}",
                    value_kind(&other)
                );
            }
        }
    }

    Ok(envelopes)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(map) if map.is_empty() => "an empty object",
        Value::Object(_) => "a multi-key object",
    }
}
