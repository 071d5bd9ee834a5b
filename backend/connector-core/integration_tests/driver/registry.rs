//! Device bookkeeping over a live connection.

use crate::helpers::{
    TEST_TIMEOUT, accept, bind, close, complete_handshake, device, intiface_config, send_json,
    send_text,
};

use connector_core::connection::{ConnectionDriver, DriverExit};
use connector_core::session::SessionEvent;

use serde_json::json;
use tokio::sync::mpsc;

/// **VALUE**: The registry mirrors the server's device set after a mixed
/// stream of list, removal, garbage and add frames.
///
/// **WHY THIS MATTERS**: Overlays render directly from the registry; a stale
/// or missing entry means a dead control on stream.
///
/// **BUG THIS CATCHES**: Would catch a malformed frame that kills the
/// receive loop, or a removal that is applied before an earlier add.
#[tokio::test]
async fn given_device_traffic_when_driver_runs_then_registry_matches_server() {
    // GIVEN: A server that lists three devices, removes one, sends garbage, then adds one
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        complete_handshake(&mut ws).await;
        send_json(
            &mut ws,
            json!([{"DeviceList": {"Id": 2, "Devices": [
                device(0, "Lovense Hush"),
                device(4, "Lovense Edge"),
                device(9, "Kiiroo Onyx"),
            ]}}]),
        )
        .await;
        send_json(&mut ws, json!([{"DeviceRemoved": {"Id": 0, "DeviceIndex": 9}}])).await;
        send_text(&mut ws, "this is not json").await;
        send_json(&mut ws, json!([{"DeviceAdded": device(7, "We-Vibe Sync")}])).await;
        close(&mut ws).await;
    });

    // WHEN: Running the driver with an event channel
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut driver = ConnectionDriver::new(&intiface_config(port))
        .unwrap()
        .with_events(events_tx);
    let exit = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish")
        .unwrap();
    server.await.unwrap();

    // THEN: Registry holds exactly the surviving devices
    assert_eq!(exit, DriverExit::PeerClosed);
    let registry = driver.session().registry();
    assert_eq!(registry.indices(), vec![0, 4, 7]);
    assert_eq!(registry.get(7).unwrap().name(), "We-Vibe Sync");

    // THEN: Events arrive in the order the frames did, ending with Closed
    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(SessionEvent::Ready(_))));
    let registered: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::DeviceRegistered(device) => Some(device.index()),
            _ => None,
        })
        .collect();
    assert_eq!(registered, vec![0, 4, 9, 7]);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, SessionEvent::DeviceRemoved(device) if device.index() == 9))
    );
    assert!(matches!(events.last(), Some(SessionEvent::Closed)));
}

#[tokio::test]
async fn given_server_error_when_driver_runs_then_error_event_published_and_loop_continues() {
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        complete_handshake(&mut ws).await;
        send_json(
            &mut ws,
            json!([{"Error": {"Id": 3, "ErrorCode": 4, "ErrorMessage": "Scanning unavailable"}}]),
        )
        .await;
        send_json(&mut ws, json!([{"DeviceAdded": device(1, "Lovense Lush")}])).await;
        close(&mut ws).await;
    });

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut driver = ConnectionDriver::new(&intiface_config(port))
        .unwrap()
        .with_events(events_tx);
    tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish")
        .unwrap();
    server.await.unwrap();

    let mut saw_error = false;
    while let Ok(event) = events_rx.try_recv() {
        if let SessionEvent::ServerError(server_error) = event {
            assert_eq!(server_error.error_code, Some(4));
            saw_error = true;
        }
    }
    assert!(saw_error);
    assert!(driver.session().registry().contains(1));
}
