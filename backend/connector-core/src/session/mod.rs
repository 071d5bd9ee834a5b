//! Protocol session: handshake state machine, dispatch and device registry.
//!
//! A [`Session`] performs no I/O. The connection driver feeds it raw text
//! frames and sends whatever [`ClientMessage`]s it hands back, in order,
//! before reading the next frame. One session belongs to exactly one
//! connection; reconnecting means building a new one.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting --begin_handshake--> AwaitingServerInfo --ServerInfo--> Active
//!      \                                  |                           |
//!       `------------------------------ close ------------------------'--> Closed
//! ```

mod dispatch;
mod event;
mod state;

pub use event::SessionEvent;
pub use state::{SessionPhase, SessionState};

use crate::MESSAGE_VERSION;
use crate::error::session::SessionError;
use crate::protocol::{ClientMessage, ServerMessage, codec};
use crate::registry::DeviceRegistry;

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::UnboundedSender;

pub struct Session {
    client_name: String,
    state: SessionState,
    registry: DeviceRegistry,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl Session {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            state: SessionState::new(),
            registry: DeviceRegistry::new(),
            events: None,
        }
    }

    /// Publish [`SessionEvent`]s to `events`. A dropped receiver is ignored.
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_state(mut self, state: SessionState) -> Self {
        self.state = state;
        self
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn is_closed(&self) -> bool {
        self.state.phase() == SessionPhase::Closed
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Produce the `RequestServerInfo` handshake and move to
    /// `AwaitingServerInfo`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidTransition`] unless the session is still
    ///   `Connecting`
    /// - [`SessionError::IdsExhausted`] if no message id is left
    #[track_caller]
    pub fn begin_handshake(&mut self) -> Result<ClientMessage, SessionError> {
        if self.state.phase() != SessionPhase::Connecting {
            return Err(SessionError::InvalidTransition {
                action: "begin a handshake",
                phase: self.state.phase(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let id = self.state.issue_id()?;
        self.state.track(id);
        self.state.transition(SessionPhase::AwaitingServerInfo);

        info!(
            "Requesting server info as '{}' (message version {MESSAGE_VERSION})",
            self.client_name
        );

        Ok(ClientMessage::RequestServerInfo {
            id,
            client_name: self.client_name.clone(),
            message_version: MESSAGE_VERSION,
        })
    }

    /// Decode one raw frame and dispatch its messages in frame order.
    ///
    /// Returns the outbound messages the handlers produced, in the order they
    /// must be sent. A frame that fails to decode is logged and dropped;
    /// frames fed to a closed session are ignored.
    ///
    /// Every message in the frame is applied before anything is sent. For
    /// `[ServerInfo, DeviceAdded]` the device is registered first and
    /// `RequestDeviceList`/`StartScanning` go out afterwards, still ahead of
    /// the next frame.
    pub fn handle_frame(&mut self, raw: &str) -> Vec<ClientMessage> {
        if self.is_closed() {
            warn!("Dropping frame received after session closed");
            return Vec::new();
        }

        let envelopes = match codec::decode(raw) {
            Ok(envelopes) => envelopes,
            Err(e) => {
                warn!("Dropping frame: {e}");
                return Vec::new();
            }
        };

        let mut outbound = Vec::new();
        for envelope in envelopes {
            outbound.extend(self.dispatch(ServerMessage::from(envelope)));
        }
        outbound
    }

    /// Move to `Closed`. Safe to call more than once; `Closed` is emitted
    /// only on the first call.
    pub fn close(&mut self) {
        if self.state.transition(SessionPhase::Closed) {
            info!(
                "Session closed with {} registered device(s)",
                self.registry.len()
            );
            self.emit(SessionEvent::Closed);
        }
    }

    /// Build a fire-and-forget request carrying the next message id.
    ///
    /// Closes the session when ids are exhausted.
    fn request(&mut self, build: impl FnOnce(u32) -> ClientMessage) -> Option<ClientMessage> {
        match self.state.issue_id() {
            Ok(id) => {
                let message = build(id);
                debug!("Queued {} (Id {})", message.tag(), message.id());
                Some(message)
            }
            Err(e) => {
                error!("{e}");
                self.close();
                None
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            // Observer gone; the session keeps running without it.
            let _ = events.send(event);
        }
    }
}
