use crate::error::connection::ConnectionError;

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, info};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

pub type IntifaceStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a WebSocket to `endpoint`, offering `subprotocol`.
///
/// # Errors
///
/// - [`ConnectionError::InvalidEndpoint`] if the URL or sub-protocol cannot
///   form a handshake request
/// - [`ConnectionError::Connect`] if the TCP/WebSocket handshake fails or the
///   server does not accept `subprotocol`
pub async fn connect(endpoint: &Url, subprotocol: &str) -> Result<IntifaceStream, ConnectionError> {
    let mut request =
        endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| ConnectionError::InvalidEndpoint {
                message: format!("Cannot build handshake request for {endpoint}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

    let protocol = HeaderValue::from_str(subprotocol).map_err(|e| {
        ConnectionError::InvalidEndpoint {
            message: format!("Invalid sub-protocol '{subprotocol}': {e}"),
            location: ErrorLocation::from(Location::caller()),
        }
    })?;
    request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocol);

    debug!("Opening WebSocket to {endpoint}");
    let (stream, response) =
        connect_async(request)
            .await
            .map_err(|e| ConnectionError::Connect {
                message: format!("Failed to connect to {endpoint}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

    let negotiated = response
        .headers()
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok());
    if negotiated != Some(subprotocol) {
        return Err(ConnectionError::Connect {
            message: format!(
                "Server at {endpoint} did not accept sub-protocol '{subprotocol}' (got {negotiated:?})"
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    info!("Connected to {endpoint} using sub-protocol {subprotocol}");
    Ok(stream)
}
