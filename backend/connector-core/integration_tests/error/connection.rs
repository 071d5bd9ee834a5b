use connector_core::error::connection::ConnectionError;
use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ConnectionError::Connect` carries file/line/column location.
///
/// **WHY THIS MATTERS**: A refused connection can come from the TCP dial, the
/// WebSocket upgrade or the sub-protocol check. The location says which one.
///
/// **BUG THIS CATCHES**: Would catch if someone removes location from the
/// Display implementation.
#[test]
#[track_caller]
fn given_connect_error_when_formatted_then_includes_location() {
    // GIVEN: A Connect error with location
    let err = ConnectionError::Connect {
        message: "Failed to connect to ws://127.0.0.1:12345/".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Formatting the error as string
    let error_string = format!("{}", err);

    // THEN: Should include error type, message, and file location
    assert!(error_string.contains("Connect Error"));
    assert!(error_string.contains("ws://127.0.0.1:12345/"));
    assert!(error_string.contains("connection.rs"));
}

#[test]
#[track_caller]
fn given_transport_error_when_formatted_then_includes_kind_and_message() {
    let err = ConnectionError::Transport {
        message: "Error reading frame: connection reset".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let error_string = err.to_string();

    assert!(error_string.starts_with("Transport Error: Error reading frame"));
    assert!(error_string.contains("connection.rs"));
}
