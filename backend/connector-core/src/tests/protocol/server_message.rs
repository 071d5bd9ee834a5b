use crate::protocol::{Envelope, ServerError, ServerInfo, ServerMessage};

use serde_json::{Value, json};

fn message(tag: &str, payload: Value) -> ServerMessage {
    ServerMessage::from(Envelope {
        tag: tag.to_string(),
        payload,
    })
}

#[test]
fn given_server_info_envelope_when_converted_then_parses_fields() {
    let parsed = message(
        "ServerInfo",
        json!({"Id": 1, "ServerName": "Intiface Server", "MessageVersion": 3, "MaxPingTime": 0}),
    );

    assert_eq!(
        parsed,
        ServerMessage::ServerInfo(ServerInfo {
            id: Some(1),
            server_name: Some("Intiface Server".to_string()),
            message_version: Some(3),
            max_ping_time: Some(0),
        })
    );
}

/// **VALUE**: A ServerInfo with an unexpected shape still completes the handshake.
#[test]
fn given_server_info_with_unexpected_shape_when_converted_then_falls_back_to_default() {
    let parsed = message("ServerInfo", json!("hello"));

    assert_eq!(parsed, ServerMessage::ServerInfo(ServerInfo::default()));
}

#[test]
fn given_device_list_without_devices_when_converted_then_yields_empty_list() {
    assert_eq!(message("DeviceList", json!({"Id": 2})), ServerMessage::DeviceList(vec![]));
    assert_eq!(
        message("DeviceList", json!({"Devices": "nope"})),
        ServerMessage::DeviceList(vec![])
    );
}

#[test]
fn given_error_envelope_when_converted_then_parses_code_and_message() {
    let parsed = message(
        "Error",
        json!({"Id": 5, "ErrorCode": 3, "ErrorMessage": "Device not found"}),
    );

    let ServerMessage::Error(server_error) = parsed else {
        panic!("Expected Error, got {parsed:?}");
    };
    assert_eq!(
        server_error,
        ServerError {
            id: Some(5),
            error_code: Some(3),
            error_message: Some("Device not found".to_string()),
        }
    );
    assert!(server_error.to_string().contains("Device not found"));
}

/// **VALUE**: Protocol extensions land in `Unknown` with their payload intact.
#[test]
fn given_unrecognised_tag_when_converted_then_yields_unknown_variant() {
    let parsed = message("ScanningFinished", json!({"Id": 0}));

    assert_eq!(parsed.tag(), "ScanningFinished");
    assert_eq!(
        parsed,
        ServerMessage::Unknown {
            tag: "ScanningFinished".to_string(),
            payload: json!({"Id": 0}),
        }
    );
}

#[test]
fn given_device_removed_with_string_index_when_converted_then_index_is_none() {
    assert_eq!(
        message("DeviceRemoved", json!({"DeviceIndex": "1"})),
        ServerMessage::DeviceRemoved { device_index: None }
    );
}
