//! Buttplug v3 JSON message layer.
//!
//! Every frame on the wire is a JSON array of single-key objects, the key
//! being the message tag:
//!
//! ```text
//! [{"RequestServerInfo": {"Id": 1, "ClientName": "StreamConnector", "MessageVersion": 3}}]
//! ```
//!
//! - [`codec`] turns frames into [`Envelope`]s and [`ClientMessage`]s into frames
//! - [`ServerMessage`] is the closed set of inbound tags the session understands
//! - [`DeviceDescriptor`] is the registry's view of one announced device

pub mod codec;
mod client_message;
mod device;
mod server_message;

pub use client_message::ClientMessage;
pub use codec::Envelope;
pub use device::DeviceDescriptor;
pub use server_message::{ServerError, ServerInfo, ServerMessage};
