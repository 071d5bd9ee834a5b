use connector_core::error::frame::FrameError;
use connector_core::protocol::codec;

/// **VALUE**: A frame that is not JSON reports as malformed, not as a protocol violation.
///
/// **WHY THIS MATTERS**: The two are logged differently; a protocol violation
/// points at a server speaking the wrong dialect, malformed JSON at a broken one.
#[test]
fn given_invalid_json_when_decoded_then_malformed_frame_error_names_kind() {
    // WHEN: Decoding garbage
    let err = codec::decode("{{{").unwrap_err();

    // THEN: Malformed, with a location
    assert!(matches!(err, FrameError::MalformedFrame { .. }));
    let error_string = err.to_string();
    assert!(error_string.contains("Malformed Frame Error"));
    assert!(error_string.contains(".rs:"));
}

#[test]
fn given_json_object_frame_when_decoded_then_protocol_violation() {
    let err = codec::decode(r#"{"Ok": {"Id": 1}}"#).unwrap_err();

    assert!(matches!(err, FrameError::ProtocolViolation { .. }));
    assert!(err.to_string().contains("Protocol Violation Error"));
}
