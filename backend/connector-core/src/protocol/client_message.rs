use serde::{Deserialize, Serialize};

/// Outbound commands. Serializes externally tagged, e.g.
/// `{"StartScanning": {"Id": 3}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all_fields = "PascalCase")]
pub enum ClientMessage {
    RequestServerInfo {
        id: u32,
        client_name: String,
        message_version: u32,
    },
    RequestDeviceList {
        id: u32,
    },
    StartScanning {
        id: u32,
    },
}

impl ClientMessage {
    pub fn id(&self) -> u32 {
        match self {
            ClientMessage::RequestServerInfo { id, .. }
            | ClientMessage::RequestDeviceList { id }
            | ClientMessage::StartScanning { id } => *id,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ClientMessage::RequestServerInfo { .. } => "RequestServerInfo",
            ClientMessage::RequestDeviceList { .. } => "RequestDeviceList",
            ClientMessage::StartScanning { .. } => "StartScanning",
        }
    }
}
