//! Tag → handler routing for inbound messages.

use crate::protocol::{ClientMessage, DeviceDescriptor, ServerError, ServerInfo, ServerMessage};
use crate::session::{Session, SessionEvent, SessionPhase};

use log::{debug, error, info, warn};
use serde_json::Value;

impl Session {
    /// Apply one inbound message and return any messages it triggers.
    ///
    /// Before the handshake completes only `ServerInfo` (and logging of
    /// server `Error`s) is acted on; everything else is ignored.
    pub(crate) fn dispatch(&mut self, message: ServerMessage) -> Vec<ClientMessage> {
        match self.state.phase() {
            SessionPhase::Active => {}
            SessionPhase::Closed => {
                debug!("Ignoring {} on closed session", message.tag());
                return Vec::new();
            }
            SessionPhase::Connecting | SessionPhase::AwaitingServerInfo => match message {
                ServerMessage::ServerInfo(info) => return self.on_server_info(info),
                ServerMessage::Error(server_error) => {
                    self.on_server_error(server_error);
                    return Vec::new();
                }
                other => {
                    info!(
                        "Ignoring {} while waiting for ServerInfo",
                        other.tag()
                    );
                    return Vec::new();
                }
            },
        }

        match message {
            ServerMessage::ServerInfo(info) => self.on_server_info(info),
            ServerMessage::DeviceList(devices) => {
                info!("Received device list ({} devices)", devices.len());
                for device in devices {
                    self.register_device(device);
                }
                Vec::new()
            }
            ServerMessage::DeviceAdded(device) => {
                self.register_device(device);
                Vec::new()
            }
            ServerMessage::DeviceRemoved { device_index } => {
                self.on_device_removed(device_index);
                Vec::new()
            }
            ServerMessage::Ok { id } => {
                if let Some(id) = id {
                    self.state.resolve(id);
                }
                debug!("Server OK (Id {id:?})");
                Vec::new()
            }
            ServerMessage::Error(server_error) => {
                self.on_server_error(server_error);
                Vec::new()
            }
            ServerMessage::Unknown { tag, payload } => {
                debug!("Unhandled message {tag}: {payload}");
                Vec::new()
            }
        }
    }

    fn on_server_info(&mut self, info: ServerInfo) -> Vec<ClientMessage> {
        match self.state.phase() {
            SessionPhase::AwaitingServerInfo => {}
            SessionPhase::Active => {
                info!("Ignoring repeated ServerInfo on active session");
                return Vec::new();
            }
            phase => {
                warn!("Ignoring ServerInfo while {phase:?}");
                return Vec::new();
            }
        }

        if let Some(id) = info.id {
            if !self.state.resolve(id) {
                warn!("ServerInfo carries Id {id}, which was not pending");
            }
        }
        self.state.transition(SessionPhase::Active);

        info!(
            "Handshake complete with {} (message version {})",
            info.server_name.as_deref().unwrap_or("unnamed server"),
            info.message_version
                .map_or_else(|| "unknown".to_string(), |version| version.to_string()),
        );
        self.emit(SessionEvent::Ready(info));

        let mut outbound = Vec::with_capacity(2);
        outbound.extend(self.request(|id| ClientMessage::RequestDeviceList { id }));
        if !self.is_closed() {
            outbound.extend(self.request(|id| ClientMessage::StartScanning { id }));
        }
        outbound
    }

    fn register_device(&mut self, payload: Value) {
        let Some(device) = DeviceDescriptor::from_payload(payload) else {
            warn!("Skipping device descriptor without a numeric DeviceIndex");
            return;
        };

        match self.registry.upsert(device.clone()) {
            Some(previous) => info!(
                "Replaced device [{}] {} with {}",
                device.index(),
                previous.name(),
                device.name()
            ),
            None => info!("Registered device [{}] {}", device.index(), device.name()),
        }
        self.emit(SessionEvent::DeviceRegistered(device));
    }

    fn on_device_removed(&mut self, device_index: Option<u32>) {
        let Some(index) = device_index else {
            warn!("DeviceRemoved without a numeric DeviceIndex");
            return;
        };

        match self.registry.remove(index) {
            Some(removed) => {
                info!("Device removed: [{index}] {}", removed.name());
                self.emit(SessionEvent::DeviceRemoved(removed));
            }
            None => debug!("DeviceRemoved for unknown index {index}"),
        }
    }

    fn on_server_error(&mut self, server_error: ServerError) {
        if let Some(id) = server_error.id {
            self.state.resolve(id);
        }
        error!("Server error: {server_error}");
        self.emit(SessionEvent::ServerError(server_error));
    }
}
