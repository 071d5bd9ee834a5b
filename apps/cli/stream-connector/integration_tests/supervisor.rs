//! Supervisor behaviour against a loopback Intiface stand-in.

use stream_connector::error::ConnectorAppError;
use stream_connector::supervisor::run_until;

use connector_core::BUTTPLUG_SUBPROTOCOL;
use connector_core::config::ConnectorConfig;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn echo_subprotocol(_request: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    response.headers_mut().insert(
        SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(BUTTPLUG_SUBPROTOCOL),
    );
    Ok(response)
}

async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn config_for(port: u16, reconnect: bool) -> ConnectorConfig {
    let mut config = ConnectorConfig::default();
    config.intiface.port = port;
    config.reconnect.enabled = reconnect;
    config.reconnect.initial_interval_ms = 20;
    config.reconnect.max_interval_ms = 50;
    config
}

/// Accept one client, complete the handshake, then hang up.
async fn serve_one_session(listener: &TcpListener) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws: WebSocketStream<_> = accept_hdr_async(stream, echo_subprotocol).await.unwrap();

    // RequestServerInfo
    ws.next().await.unwrap().unwrap();
    ws.send(Message::Text(
        json!([{"ServerInfo": {"Id": 1, "ServerName": "Loopback", "MessageVersion": 3, "MaxPingTime": 0}}])
            .to_string()
            .into(),
    ))
    .await
    .unwrap();
    // RequestDeviceList, StartScanning
    ws.next().await.unwrap().unwrap();
    ws.next().await.unwrap().unwrap();

    let _ = ws.close(None).await;
}

#[tokio::test]
async fn given_reconnect_disabled_when_server_hangs_up_then_supervisor_returns_ok() {
    // GIVEN: A server good for exactly one session
    let (listener, port) = bind().await;
    let server = tokio::spawn(async move { serve_one_session(&listener).await });
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    // WHEN: Supervising without reconnects
    let result = tokio::time::timeout(TEST_TIMEOUT, run_until(&config_for(port, false), shutdown_rx))
        .await
        .expect("Supervisor did not finish");

    // THEN: One session, clean exit
    server.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn given_reconnect_disabled_when_nothing_listening_then_core_error() {
    let (listener, port) = bind().await;
    drop(listener);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let result = tokio::time::timeout(TEST_TIMEOUT, run_until(&config_for(port, false), shutdown_rx))
        .await
        .expect("Supervisor did not finish");

    assert!(matches!(result, Err(ConnectorAppError::Core { .. })));
}

/// **VALUE**: With reconnects on, a dropped Intiface connection is re-established
/// with a brand new session.
///
/// **WHY THIS MATTERS**: Streamers restart Intiface Central mid-stream; the
/// overlay has to come back without a restart of its own.
///
/// **BUG THIS CATCHES**: Would catch a supervisor that reuses the closed
/// session (second handshake refused) or stops after the first hang-up.
#[tokio::test]
async fn given_reconnect_enabled_when_server_hangs_up_then_reconnects_until_shutdown() {
    // GIVEN: A server that serves two sessions, then requests shutdown
    let (listener, port) = bind().await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(async move {
        serve_one_session(&listener).await;
        serve_one_session(&listener).await;
        let _ = shutdown_tx.send(true);
    });

    // WHEN: Supervising with reconnects
    let result = tokio::time::timeout(TEST_TIMEOUT, run_until(&config_for(port, true), shutdown_rx))
        .await
        .expect("Supervisor did not stop on shutdown");

    // THEN: Both sessions completed a handshake and the supervisor stopped cleanly
    server.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn given_reconnect_limit_when_server_never_appears_then_gives_up_with_app_error() {
    let (listener, port) = bind().await;
    drop(listener);
    let mut config = config_for(port, true);
    config.reconnect.max_elapsed_secs = Some(0);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let result = tokio::time::timeout(TEST_TIMEOUT, run_until(&config, shutdown_rx))
        .await
        .expect("Supervisor did not give up");

    assert!(matches!(result, Err(ConnectorAppError::App { .. })));
}
