// Unit tests for registry updates driven through the dispatch table.

use crate::session::SessionEvent;
use crate::tests::session::{TEST_CLIENT_NAME, active_session, device, frame};

use serde_json::json;
use tokio::sync::mpsc;

/// **VALUE**: List-then-remove leaves exactly the surviving devices.
///
/// **BUG THIS CATCHES**: Would catch removal by position instead of index,
/// or a DeviceList that appends duplicates.
#[test]
fn given_device_list_when_one_removed_then_registry_holds_the_rest() {
    // GIVEN: An active session that received three devices
    let mut session = active_session();
    session.handle_frame(&frame(json!([{"DeviceList": {"Id": 2, "Devices": [
        device(0, "Edge"),
        device(1, "Hush"),
        device(4, "Max")
    ]}}])));
    assert_eq!(session.registry().len(), 3);

    // WHEN: Device 1 is removed
    session.handle_frame(&frame(json!([{"DeviceRemoved": {"DeviceIndex": 1}}])));

    // THEN: Two remain and index 1 is gone
    assert_eq!(session.registry().len(), 2);
    assert!(!session.registry().contains(1));
    assert_eq!(session.registry().indices(), vec![0, 4]);
}

#[test]
fn given_same_device_added_twice_when_dispatched_then_single_entry_with_latest_payload() {
    let mut session = active_session();

    session.handle_frame(&frame(json!([{"DeviceAdded": device(3, "First")}])));
    session.handle_frame(&frame(json!([{"DeviceAdded": {
        "DeviceIndex": 3,
        "DeviceName": "Second",
        "DeviceMessages": {"LinearCmd": [{"StepCount": 100}]}
    }}])));

    assert_eq!(session.registry().len(), 1);
    let stored = session.registry().get(3).unwrap();
    assert_eq!(stored.name(), "Second");
    assert!(stored.capabilities().contains_key("LinearCmd"));
    assert!(!stored.capabilities().contains_key("ScalarCmd"));
}

/// **VALUE**: Messages inside one frame apply in order.
///
/// **BUG THIS CATCHES**: Would catch any reordering (e.g. grouping removals
/// before additions) that would leave a just-removed device registered.
#[test]
fn given_add_then_remove_in_one_frame_when_dispatched_then_device_absent() {
    // GIVEN: An active session
    let mut session = active_session();

    // WHEN: One frame adds then removes the same device
    session.handle_frame(&frame(json!([
        {"DeviceAdded": device(6, "Blink")},
        {"DeviceRemoved": {"DeviceIndex": 6}}
    ])));

    // THEN: The later element wins
    assert!(!session.registry().contains(6));
    assert!(session.registry().is_empty());
}

#[test]
fn given_malformed_frame_when_followed_by_device_list_then_registry_reflects_valid_frame() {
    let mut session = active_session();

    assert!(session.handle_frame("not json").is_empty());
    assert!(session.handle_frame(r#"{"DeviceList": {}}"#).is_empty());
    session.handle_frame(&frame(json!([{"DeviceList": {"Devices": [device(0, "Edge")]}}])));

    assert_eq!(session.registry().indices(), vec![0]);
}

#[test]
fn given_device_without_index_when_listed_then_skipped_and_siblings_registered() {
    let mut session = active_session();

    session.handle_frame(&frame(json!([{"DeviceList": {"Devices": [
        {"DeviceName": "No Index"},
        device(2, "Indexed")
    ]}}])));

    assert_eq!(session.registry().indices(), vec![2]);
}

#[test]
fn given_unknown_device_index_when_removed_then_noop() {
    let mut session = active_session();
    session.handle_frame(&frame(json!([{"DeviceAdded": device(0, "Edge")}])));

    let outbound = session.handle_frame(&frame(json!([{"DeviceRemoved": {"DeviceIndex": 99}}])));

    assert!(outbound.is_empty());
    assert_eq!(session.registry().len(), 1);
}

/// **VALUE**: Server errors reach the observer without disturbing the session.
#[test]
fn given_server_error_when_dispatched_then_surfaced_and_session_unchanged() {
    // GIVEN: An active session with an observer and one device
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut session = crate::session::Session::new(TEST_CLIENT_NAME).with_events(events_tx);
    session.begin_handshake().unwrap();
    session.handle_frame(&frame(json!([{"ServerInfo": {"Id": 1}}])));
    session.handle_frame(&frame(json!([{"DeviceAdded": device(0, "Edge")}])));

    // WHEN: The server reports an error
    session.handle_frame(&frame(json!([{"Error": {"Id": 2, "ErrorCode": 4, "ErrorMessage": "Device busy"}}])));

    // THEN: The error is published and nothing else changed
    let server_error = std::iter::from_fn(|| events_rx.try_recv().ok())
        .find_map(|event| match event {
            SessionEvent::ServerError(server_error) => Some(server_error),
            _ => None,
        })
        .expect("ServerError event should be published");
    assert_eq!(server_error.error_code, Some(4));
    assert_eq!(session.registry().len(), 1);
    assert!(!session.is_closed());
}

#[test]
fn given_unknown_tag_when_dispatched_then_no_state_change() {
    let mut session = active_session();
    let next_id = session.state().next_message_id();

    let outbound = session.handle_frame(&frame(json!([{"SensorReading": {"Id": 0, "Data": [1, 2]}}])));

    assert!(outbound.is_empty());
    assert!(session.registry().is_empty());
    assert_eq!(session.state().next_message_id(), next_id);
}

/// **VALUE**: A device announced alongside `ServerInfo` is registered before
/// the startup requests are handed back.
///
/// **WHY THIS MATTERS**: The driver sends the returned requests only after
/// the whole frame is applied, so they still precede the next frame.
#[test]
fn given_server_info_and_device_in_one_frame_when_handled_then_device_registered_and_requests_returned() {
    // GIVEN: A session waiting for ServerInfo
    let mut session = crate::session::Session::new(TEST_CLIENT_NAME);
    session.begin_handshake().unwrap();

    // WHEN: One frame carries ServerInfo then DeviceAdded
    let outbound = session.handle_frame(&frame(json!([
        {"ServerInfo": {"Id": 1, "MessageVersion": 3}},
        {"DeviceAdded": device(2, "Gush")}
    ])));

    // THEN: The device is in and Ids 2 then 3 are queued, in that order
    assert_eq!(session.registry().indices(), vec![2]);
    assert_eq!(
        outbound,
        vec![
            crate::protocol::ClientMessage::RequestDeviceList { id: 2 },
            crate::protocol::ClientMessage::StartScanning { id: 3 },
        ]
    );
}
