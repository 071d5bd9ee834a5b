// Unit tests for the array-of-objects framing.

use crate::error::frame::FrameError;
use crate::protocol::codec::{decode, encode};
use crate::protocol::{ClientMessage, Envelope};

use serde_json::{Value, json};

/// **VALUE**: Decoding what we encode yields the same single message.
///
/// **WHY THIS MATTERS**: Intiface rejects frames that are not array-wrapped.
/// If encode ever emitted a bare object, or decode lost the payload, every
/// outbound command would silently fail.
///
/// **BUG THIS CATCHES**: Would catch if encode stopped wrapping in an array,
/// or if field names drift from the PascalCase the server expects.
#[test]
fn given_client_message_when_encoded_then_decodes_to_single_equal_element() {
    // GIVEN: A handshake request
    let message = ClientMessage::RequestServerInfo {
        id: 1,
        client_name: "StreamConnector".to_string(),
        message_version: 3,
    };

    // WHEN: Encoding then decoding
    let frame = encode(&message).unwrap();
    let envelopes = decode(&frame).unwrap();

    // THEN: Exactly one element, semantically equal to the original
    assert_eq!(envelopes.len(), 1, "Should decode to exactly one element");
    let Envelope { tag, payload } = envelopes.into_iter().next().unwrap();
    assert_eq!(tag, "RequestServerInfo");
    let decoded: ClientMessage = serde_json::from_value(json!({ tag: payload })).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn given_start_scanning_when_encoded_then_matches_wire_format() {
    let frame = encode(&ClientMessage::StartScanning { id: 3 }).unwrap();

    let value: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value, json!([{"StartScanning": {"Id": 3}}]));
}

#[test]
fn given_handshake_when_encoded_then_uses_pascal_case_fields() {
    let frame = encode(&ClientMessage::RequestServerInfo {
        id: 7,
        client_name: "Tester".to_string(),
        message_version: 3,
    })
    .unwrap();

    let value: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(
        value,
        json!([{"RequestServerInfo": {"Id": 7, "ClientName": "Tester", "MessageVersion": 3}}])
    );
}

/// **VALUE**: Non-JSON text is reported as a malformed frame, not a panic.
#[test]
fn given_non_json_text_when_decoded_then_returns_malformed_frame() {
    let result = decode("not json");

    assert!(
        matches!(result, Err(FrameError::MalformedFrame { .. })),
        "Expected MalformedFrame, got {result:?}"
    );
}

#[test]
fn given_top_level_object_when_decoded_then_returns_protocol_violation() {
    let result = decode(r#"{"ServerInfo": {}}"#);

    assert!(
        matches!(result, Err(FrameError::ProtocolViolation { .. })),
        "Expected ProtocolViolation, got {result:?}"
    );
}

/// **VALUE**: One bad element does not cost us its siblings.
///
/// **BUG THIS CATCHES**: Would catch if decode switched to all-or-nothing
/// parsing, dropping a `DeviceAdded` because a neighbour was garbage.
#[test]
fn given_frame_with_invalid_elements_when_decoded_then_keeps_valid_siblings() {
    // GIVEN: A frame mixing valid and invalid elements
    let raw = json!([
        {"Ok": {"Id": 2}},
        42,
        {"A": {}, "B": {}},
        {},
        {"DeviceRemoved": {"DeviceIndex": 0}}
    ])
    .to_string();

    // WHEN: Decoding
    let envelopes = decode(&raw).unwrap();

    // THEN: Only the two single-key objects survive, in order
    let tags: Vec<&str> = envelopes.iter().map(|e| e.tag.as_str()).collect();
    assert_eq!(tags, vec!["Ok", "DeviceRemoved"]);
}

#[test]
fn given_empty_array_when_decoded_then_returns_no_envelopes() {
    assert!(decode("[]").unwrap().is_empty());
}
