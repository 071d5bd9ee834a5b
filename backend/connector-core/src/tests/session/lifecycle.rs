// Unit tests for the handshake state machine.

use crate::error::session::SessionError;
use crate::protocol::ClientMessage;
use crate::session::{Session, SessionEvent, SessionPhase, SessionState};
use crate::tests::session::{TEST_CLIENT_NAME, active_session, device, frame};

use serde_json::json;
use tokio::sync::mpsc;

/// **VALUE**: The startup sequence follows the handshake with the right ids.
///
/// **WHY THIS MATTERS**: Intiface only enumerates devices after the client asks.
/// If the device-list and scan requests were skipped, reordered, or reused an
/// id, the registry would stay empty or the server would reject the messages.
///
/// **BUG THIS CATCHES**: Would catch a regression in id allocation or in the
/// order of the post-handshake requests.
#[test]
fn given_handshake_sent_when_server_info_received_then_requests_list_then_scan() {
    // GIVEN: A session that sent its handshake
    let mut session = Session::new(TEST_CLIENT_NAME);
    let handshake = session.begin_handshake().unwrap();
    assert_eq!(
        handshake,
        ClientMessage::RequestServerInfo {
            id: 1,
            client_name: TEST_CLIENT_NAME.to_string(),
            message_version: 3,
        }
    );
    assert_eq!(session.phase(), SessionPhase::AwaitingServerInfo);

    // WHEN: ServerInfo arrives
    let outbound = session.handle_frame(&frame(json!([{"ServerInfo": {"Id": 1}}])));

    // THEN: Active, followed by RequestDeviceList(2) then StartScanning(3)
    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(
        outbound,
        vec![
            ClientMessage::RequestDeviceList { id: 2 },
            ClientMessage::StartScanning { id: 3 },
        ]
    );
    assert!(
        session.state().pending_requests().is_empty(),
        "Handshake id should be resolved by ServerInfo"
    );
}

#[test]
fn given_active_session_when_non_terminating_messages_arrive_then_stays_active() {
    let mut session = active_session();

    for raw in [
        frame(json!([{"Ok": {"Id": 2}}])),
        frame(json!([{"Error": {"Id": 3, "ErrorCode": 1, "ErrorMessage": "busy"}}])),
        frame(json!([{"DeviceAdded": device(0, "Edge")}])),
        frame(json!([{"ScanningFinished": {"Id": 0}}])),
        "not json".to_string(),
        frame(json!([{"ServerInfo": {"Id": 1}}])),
    ] {
        session.handle_frame(&raw);
        assert_eq!(session.phase(), SessionPhase::Active, "After frame {raw}");
    }
}

/// **VALUE**: A repeated ServerInfo does not restart the startup sequence.
#[test]
fn given_active_session_when_server_info_repeats_then_sends_nothing() {
    let mut session = active_session();

    let outbound = session.handle_frame(&frame(json!([{"ServerInfo": {}}])));

    assert!(outbound.is_empty());
    assert_eq!(session.state().next_message_id(), 4);
}

#[test]
fn given_awaiting_server_info_when_other_tags_arrive_then_ignored() {
    // GIVEN: Handshake sent, no reply yet
    let mut session = Session::new(TEST_CLIENT_NAME);
    session.begin_handshake().unwrap();

    // WHEN: The server interleaves unrelated messages
    let outbound = session.handle_frame(&frame(json!([
        {"DeviceAdded": device(0, "Early")},
        {"Ok": {"Id": 1}},
        {"Error": {"ErrorMessage": "noise"}}
    ])));

    // THEN: Nothing changes
    assert!(outbound.is_empty());
    assert_eq!(session.phase(), SessionPhase::AwaitingServerInfo);
    assert!(session.registry().is_empty());
    assert!(session.state().pending_requests().contains(&1));
}

#[test]
fn given_connecting_session_when_server_info_arrives_then_ignored() {
    let mut session = Session::new(TEST_CLIENT_NAME);

    let outbound = session.handle_frame(&frame(json!([{"ServerInfo": {}}])));

    assert!(outbound.is_empty());
    assert_eq!(session.phase(), SessionPhase::Connecting);
}

#[test]
fn given_handshake_already_sent_when_begin_handshake_called_again_then_returns_error() {
    let mut session = Session::new(TEST_CLIENT_NAME);
    session.begin_handshake().unwrap();

    let result = session.begin_handshake();

    assert!(matches!(
        result,
        Err(SessionError::InvalidTransition {
            phase: SessionPhase::AwaitingServerInfo,
            ..
        })
    ));
}

/// **VALUE**: A closed session neither processes frames nor produces sends.
///
/// **BUG THIS CATCHES**: Would catch a closed session that still mutates the
/// registry or queues requests for a socket that is gone.
#[test]
fn given_closed_session_when_frame_arrives_then_dropped() {
    // GIVEN: An active session that has been closed
    let mut session = active_session();
    session.close();

    // WHEN: More frames arrive
    let outbound = session.handle_frame(&frame(json!([
        {"DeviceAdded": device(0, "Late")},
        {"ServerInfo": {"Id": 1}}
    ])));

    // THEN: Nothing happens
    assert!(outbound.is_empty());
    assert!(session.registry().is_empty());
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert!(session.begin_handshake().is_err());
}

#[test]
fn given_observer_when_session_runs_then_events_arrive_in_order() {
    // GIVEN: A session wired to an event channel
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut session = Session::new(TEST_CLIENT_NAME).with_events(events_tx);

    // WHEN: Handshake, device add/remove, then close (twice)
    session.begin_handshake().unwrap();
    session.handle_frame(&frame(json!([{"ServerInfo": {"Id": 1, "ServerName": "Intiface"}}])));
    session.handle_frame(&frame(json!([
        {"DeviceAdded": device(2, "Nora")},
        {"DeviceRemoved": {"DeviceIndex": 2}}
    ])));
    session.close();
    session.close();

    // THEN: Ready, Registered, Removed, Closed, and Closed only once
    let mut kinds = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        kinds.push(match event {
            SessionEvent::Ready(info) => {
                assert_eq!(info.server_name.as_deref(), Some("Intiface"));
                "ready"
            }
            SessionEvent::DeviceRegistered(device) => {
                assert_eq!(device.index(), 2);
                "registered"
            }
            SessionEvent::DeviceRemoved(device) => {
                assert_eq!(device.name(), "Nora");
                "removed"
            }
            SessionEvent::ServerError(_) => "error",
            SessionEvent::Closed => "closed",
        });
    }
    assert_eq!(kinds, vec!["ready", "registered", "removed", "closed"]);
}

#[test]
fn given_ids_exhausted_when_server_info_arrives_then_session_closes_without_requests() {
    // GIVEN: A handshake sent with the last usable id
    let mut session =
        Session::new(TEST_CLIENT_NAME).with_state(SessionState::starting_at(u32::MAX - 1));
    let handshake = session.begin_handshake().unwrap();
    assert_eq!(handshake.id(), u32::MAX - 1);

    // WHEN: ServerInfo asks for the startup requests
    let outbound = session.handle_frame(&frame(json!([{"ServerInfo": {"Id": u32::MAX - 1, "MessageVersion": 3}}])));

    // THEN: No request goes out and the session is closed
    assert!(outbound.is_empty());
    assert_eq!(session.phase(), SessionPhase::Closed);
}
