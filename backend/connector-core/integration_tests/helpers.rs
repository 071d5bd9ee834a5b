//! Test helpers for driver integration tests.
//!
//! Provides a loopback stand-in for Intiface Central:
//! - Binding an ephemeral port
//! - Accepting with (or refusing) the `buttplug-json` sub-protocol
//! - Sending/receiving JSON frames
//! - Scripting the handshake

use connector_core::BUTTPLUG_SUBPROTOCOL;
use connector_core::config::IntifaceConfig;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

pub type ServerStream = WebSocketStream<TcpStream>;

/// Upper bound for any single step of a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Test helper: Bind a loopback listener on an ephemeral port.
pub async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let port = listener
        .local_addr()
        .expect("Listener has no local address")
        .port();
    (listener, port)
}

/// Test helper: Intiface settings pointing at `port` on loopback.
pub fn intiface_config(port: u16) -> IntifaceConfig {
    IntifaceConfig {
        host: "127.0.0.1".to_string(),
        port,
        ..IntifaceConfig::default()
    }
}

/// Handshake callback that echoes `buttplug-json` when offered and refuses otherwise.
fn negotiate_buttplug(request: &Request, mut response: Response) -> Result<Response, ErrorResponse> {
    let offered = request
        .headers()
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if offered
        .split(',')
        .any(|protocol| protocol.trim() == BUTTPLUG_SUBPROTOCOL)
    {
        response.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(BUTTPLUG_SUBPROTOCOL),
        );
        Ok(response)
    } else {
        Err(refusal())
    }
}

/// Handshake callback that refuses every client.
fn refuse_all(_request: &Request, _response: Response) -> Result<Response, ErrorResponse> {
    Err(refusal())
}

fn refusal() -> ErrorResponse {
    let mut rejection = ErrorResponse::new(Some("unsupported sub-protocol".to_string()));
    *rejection.status_mut() = StatusCode::BAD_REQUEST;
    rejection
}

/// Test helper: Accept one client, negotiating the Buttplug sub-protocol.
pub async fn accept(listener: &TcpListener) -> ServerStream {
    let (stream, _) = listener.accept().await.expect("Failed to accept client");
    accept_hdr_async(stream, negotiate_buttplug)
        .await
        .expect("WebSocket handshake failed")
}

/// Test helper: Accept one TCP client and refuse its WebSocket upgrade.
pub async fn accept_and_refuse(listener: &TcpListener) {
    let (stream, _) = listener.accept().await.expect("Failed to accept client");
    let result = accept_hdr_async(stream, refuse_all).await;
    assert!(result.is_err(), "Upgrade should have been refused");
}

/// Test helper: Receive the next text frame and parse it as JSON.
pub async fn receive_json(ws: &mut ServerStream) -> Value {
    loop {
        let message = tokio::time::timeout(TEST_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a client frame")
            .expect("Client disconnected")
            .expect("Error receiving frame");

        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("Client sent invalid JSON");
        }
    }
}

/// Test helper: Send a JSON value as a text frame.
pub async fn send_json(ws: &mut ServerStream, value: Value) {
    send_text(ws, &value.to_string()).await;
}

/// Test helper: Send raw text as a frame.
pub async fn send_text(ws: &mut ServerStream, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("Failed to send frame");
}

/// The three frames a client sends while getting started.
pub struct Startup {
    pub handshake: Value,
    pub device_list_request: Value,
    pub scan_request: Value,
}

/// Test helper: Answer the handshake and collect the startup requests.
pub async fn complete_handshake(ws: &mut ServerStream) -> Startup {
    let handshake = receive_json(ws).await;
    send_json(
        ws,
        json!([{"ServerInfo": {"Id": 1, "ServerName": "Loopback Intiface", "MessageVersion": 3, "MaxPingTime": 0}}]),
    )
    .await;

    Startup {
        handshake,
        device_list_request: receive_json(ws).await,
        scan_request: receive_json(ws).await,
    }
}

/// Test helper: Close from the server side, ignoring errors from a client that already left.
pub async fn close(ws: &mut ServerStream) {
    let _ = ws.close(None).await;
}

pub fn device(index: u32, name: &str) -> Value {
    json!({
        "DeviceIndex": index,
        "DeviceName": name,
        "DeviceMessages": {"ScalarCmd": [{"StepCount": 20, "ActuatorType": "Vibrate"}]}
    })
}
