use crate::protocol::{DeviceDescriptor, ServerError, ServerInfo};

/// Notifications a session pushes to its observer, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Handshake finished; the session is `Active`.
    Ready(ServerInfo),
    DeviceRegistered(DeviceDescriptor),
    DeviceRemoved(DeviceDescriptor),
    ServerError(ServerError),
    Closed,
}
