use crate::config::IntifaceConfig;
use crate::connection::transport;
use crate::error::CoreError;
use crate::error::connection::ConnectionError;
use crate::error::session::SessionError;
use crate::protocol::{ClientMessage, codec};
use crate::session::{Session, SessionEvent, SessionPhase};

use common::ErrorLocation;

use std::future::Future;
use std::panic::Location;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use url::Url;

/// How a driver run ended without a transport fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverExit {
    /// The server closed the connection.
    PeerClosed,
    /// The caller's shutdown future resolved.
    Cancelled,
}

/// Drives one [`Session`] over one WebSocket connection.
///
/// Frames are processed strictly one at a time: a frame is decoded,
/// dispatched and every resulting message sent before the next frame is
/// read. The only suspension points are the read and the sends.
pub struct ConnectionDriver {
    endpoint: Url,
    subprotocol: String,
    session: Session,
}

impl ConnectionDriver {
    /// Build a driver with a fresh session from the Intiface settings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the endpoint URL is invalid.
    pub fn new(config: &IntifaceConfig) -> Result<Self, CoreError> {
        Ok(Self {
            endpoint: config.endpoint_url()?,
            subprotocol: config.subprotocol.clone(),
            session: Session::new(config.client_name.clone()),
        })
    }

    /// Forward session events to `events`.
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.session = self.session.with_events(events);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Connect, handshake and run the receive loop until the connection ends
    /// or `shutdown` resolves.
    ///
    /// The session is `Closed` when this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Session`] if this driver has already been run
    /// - [`CoreError::Connection`] on connect, read or send failure
    pub async fn run<F>(&mut self, shutdown: F) -> Result<DriverExit, CoreError>
    where
        F: Future<Output = ()>,
    {
        if self.session.phase() != SessionPhase::Connecting {
            return Err(SessionError::InvalidTransition {
                action: "start a connection",
                phase: self.session.phase(),
                location: ErrorLocation::from(Location::caller()),
            }
            .into());
        }

        tokio::pin!(shutdown);

        info!(
            "Connecting to Intiface at {} as '{}'",
            self.endpoint,
            self.session.client_name()
        );
        let connected = tokio::select! {
            result = transport::connect(&self.endpoint, &self.subprotocol) => result,
            _ = &mut shutdown => {
                info!("Shutdown requested before connection was established");
                self.session.close();
                return Ok(DriverExit::Cancelled);
            }
        };

        let mut stream = match connected {
            Ok(stream) => stream,
            Err(e) => {
                error!("{e}");
                self.session.close();
                return Err(e.into());
            }
        };

        let outcome = tokio::select! {
            result = self.serve(&mut stream) => result,
            _ = &mut shutdown => {
                info!("Shutdown requested, closing connection");
                Ok(DriverExit::Cancelled)
            }
        };

        self.session.close();

        // Sends our close frame on cancel, or flushes the queued reply to the
        // server's close frame on PeerClosed.
        if outcome.is_ok() {
            if let Err(e) = stream.close(None).await {
                debug!("Close handshake did not complete: {e}");
            }
        }

        outcome
    }

    /// Handshake, then process frames until the stream ends.
    async fn serve<S>(&mut self, stream: &mut S) -> Result<DriverExit, CoreError>
    where
        S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
    {
        let handshake = self.session.begin_handshake()?;
        send(stream, &handshake).await?;

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    for outbound in self.session.handle_frame(text.as_str()) {
                        if self.session.is_closed() {
                            break;
                        }
                        send(stream, &outbound).await?;
                    }
                }
                Ok(Message::Binary(data)) => {
                    warn!("Ignoring {} byte binary frame", data.len());
                }
                Ok(Message::Close(frame)) => {
                    info!("Server closed the connection: {frame:?}");
                    return Ok(DriverExit::PeerClosed);
                }
                Ok(_) => {}
                Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                    info!("Connection closed");
                    return Ok(DriverExit::PeerClosed);
                }
                Err(e) => {
                    error!("Error reading from Intiface: {e}");
                    return Err(ConnectionError::Transport {
                        message: format!("Error reading frame: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    }
                    .into());
                }
            }
        }

        info!("Connection stream ended");
        Ok(DriverExit::PeerClosed)
    }
}

/// Encode and send one message.
///
/// An encode failure drops only that message; a send failure is fatal.
async fn send<S>(stream: &mut S, message: &ClientMessage) -> Result<(), ConnectionError>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let frame = match codec::encode(message) {
        Ok(frame) => frame,
        Err(e) => {
            error!("Dropping outbound message: {e}");
            return Ok(());
        }
    };

    stream
        .send(Message::Text(frame.into()))
        .await
        .map_err(|e| ConnectionError::Send {
            message: format!("Failed to send {} (Id {}): {e}", message.tag(), message.id()),
            location: ErrorLocation::from(Location::caller()),
        })?;

    debug!("Sent {} (Id {})", message.tag(), message.id());
    Ok(())
}
