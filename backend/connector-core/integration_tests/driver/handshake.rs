//! Handshake and startup sequencing against a loopback server.

use crate::helpers::{
    ServerStream, TEST_TIMEOUT, accept, bind, close, complete_handshake, device, intiface_config,
    receive_json, send_json,
};

use connector_core::connection::{ConnectionDriver, DriverExit};
use connector_core::session::SessionPhase;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

/// **VALUE**: The wire-level startup sequence is exactly what Intiface expects.
///
/// **WHY THIS MATTERS**: Intiface rejects clients whose first message is not
/// `RequestServerInfo`, and correlates replies by Id.
///
/// **BUG THIS CATCHES**: Would catch sending the device list request before
/// the `ServerInfo` reply, or reusing Id 1 for follow-up requests.
#[tokio::test]
async fn given_loopback_server_when_driver_runs_then_sends_ids_one_two_three() {
    // GIVEN: A server that completes the handshake and then hangs up
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let startup = complete_handshake(&mut ws).await;
        close(&mut ws).await;
        startup
    });

    // WHEN: Running a driver against it
    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();
    let exit = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish")
        .unwrap();

    // THEN: Three frames in order with Ids 1, 2, 3
    let startup = server.await.unwrap();
    assert_eq!(
        startup.handshake,
        json!([{"RequestServerInfo": {"Id": 1, "ClientName": "StreamConnector", "MessageVersion": 3}}])
    );
    assert_eq!(
        startup.device_list_request,
        json!([{"RequestDeviceList": {"Id": 2}}])
    );
    assert_eq!(startup.scan_request, json!([{"StartScanning": {"Id": 3}}]));

    // THEN: Server close ends the run cleanly and closes the session
    assert_eq!(exit, DriverExit::PeerClosed);
    assert_eq!(driver.session().phase(), SessionPhase::Closed);
}

#[tokio::test]
async fn given_no_server_info_when_server_sends_devices_then_nothing_registered() {
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _handshake = receive_json(&mut ws).await;
        send_json(
            &mut ws,
            json!([{"DeviceAdded": device(0, "Early Device")}]),
        )
        .await;
        close(&mut ws).await;
    });

    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();
    let exit = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish")
        .unwrap();
    server.await.unwrap();

    assert_eq!(exit, DriverExit::PeerClosed);
    assert!(driver.session().registry().is_empty());
}

async fn expect_close_frame(ws: &mut ServerStream) -> bool {
    loop {
        match tokio::time::timeout(TEST_TIMEOUT, ws.next()).await {
            Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
            _ => return false,
        }
    }
}

/// **VALUE**: Cancelling a running driver closes the socket politely.
///
/// **BUG THIS CATCHES**: Would catch a cancelled run that drops the TCP
/// stream without a close frame, which Intiface logs as a client crash.
#[tokio::test]
async fn given_active_session_when_shutdown_fires_then_cancelled_with_close_frame() {
    // GIVEN: A server that triggers shutdown once the client is active
    let (listener, port) = bind().await;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        complete_handshake(&mut ws).await;
        let _ = shutdown_tx.send(());
        expect_close_frame(&mut ws).await
    });

    // WHEN: The shutdown future resolves mid-session
    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();
    let exit = tokio::time::timeout(
        TEST_TIMEOUT,
        driver.run(async {
            let _ = shutdown_rx.await;
        }),
    )
    .await
    .expect("Driver did not finish")
    .unwrap();

    // THEN: The run reports cancellation and the server saw a close frame
    assert_eq!(exit, DriverExit::Cancelled);
    assert_eq!(driver.session().phase(), SessionPhase::Closed);
    assert!(server.await.unwrap(), "Server never received a close frame");
}

/// **VALUE**: When Intiface hangs up, the client answers its close frame.
///
/// **WHY THIS MATTERS**: Without the reply the server sees a reset instead of
/// a closing handshake and logs the client as having crashed.
///
/// **BUG THIS CATCHES**: Would catch a driver that returns on the server's
/// close frame without flushing the queued close reply.
#[tokio::test]
async fn given_server_sends_close_when_driver_exits_then_close_frame_answered() {
    // GIVEN: A server that closes right after the startup requests
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        complete_handshake(&mut ws).await;
        ws.send(Message::Close(None))
            .await
            .expect("Failed to send close frame");
        expect_close_frame(&mut ws).await
    });

    // WHEN: The driver runs to completion
    let mut driver = ConnectionDriver::new(&intiface_config(port)).unwrap();
    let exit = tokio::time::timeout(TEST_TIMEOUT, driver.run(std::future::pending()))
        .await
        .expect("Driver did not finish")
        .unwrap();

    // THEN: Peer close reported and the server received the close reply
    assert_eq!(exit, DriverExit::PeerClosed);
    assert!(server.await.unwrap(), "Server never received a close reply");
}
