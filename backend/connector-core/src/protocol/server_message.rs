use crate::protocol::Envelope;

use std::fmt::{Display, Formatter, Result as FormatResult};

use log::warn;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Payload of the `ServerInfo` handshake reply. All fields are optional so
/// a server that omits some of them still completes the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServerInfo {
    pub id: Option<u32>,
    pub server_name: Option<String>,
    pub message_version: Option<u32>,
    pub max_ping_time: Option<u64>,
}

/// Payload of a server-reported `Error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServerError {
    pub id: Option<u32>,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
}

impl Display for ServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(
            formatter,
            "{} (code {}, id {})",
            self.error_message.as_deref().unwrap_or("no message"),
            self.error_code
                .map_or_else(|| "?".to_string(), |code| code.to_string()),
            self.id.map_or_else(|| "?".to_string(), |id| id.to_string()),
        )
    }
}

/// Inbound messages, closed over the tags this client acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    ServerInfo(ServerInfo),
    DeviceList(Vec<Value>),
    DeviceAdded(Value),
    DeviceRemoved { device_index: Option<u32> },
    Ok { id: Option<u32> },
    Error(ServerError),
    Unknown { tag: String, payload: Value },
}

impl ServerMessage {
    pub fn tag(&self) -> &str {
        match self {
            ServerMessage::ServerInfo(_) => "ServerInfo",
            ServerMessage::DeviceList(_) => "DeviceList",
            ServerMessage::DeviceAdded(_) => "DeviceAdded",
            ServerMessage::DeviceRemoved { .. } => "DeviceRemoved",
            ServerMessage::Ok { .. } => "Ok",
            ServerMessage::Error(_) => "Error",
            ServerMessage::Unknown { tag, .. } => tag,
        }
    }
}

impl From<Envelope> for ServerMessage {
    fn from(envelope: Envelope) -> Self {
        let Envelope { tag, payload } = envelope;
        match tag.as_str() {
            "ServerInfo" => ServerMessage::ServerInfo(lenient(&tag, payload)),
            "DeviceList" => ServerMessage::DeviceList(devices(payload)),
            "DeviceAdded" => ServerMessage::DeviceAdded(payload),
            "DeviceRemoved" => ServerMessage::DeviceRemoved {
                device_index: u32_field(&payload, "DeviceIndex"),
            },
            "Ok" => ServerMessage::Ok {
                id: u32_field(&payload, "Id"),
            },
            "Error" => ServerMessage::Error(lenient(&tag, payload)),
            _ => ServerMessage::Unknown { tag, payload },
        }
    }
}

/// Deserialize a payload, falling back to defaults on a shape mismatch.
fn lenient<T: DeserializeOwned + Default>(tag: &str, payload: Value) -> T {
    serde_json::from_value(payload).unwrap_or_else(|e| {
        warn!("{tag} payload did not match the expected shape: {e}");
        T::default()
    })
}

fn devices(payload: Value) -> Vec<Value> {
    match payload {
        Value::Object(mut map) => match map.remove("Devices") {
            Some(Value::Array(devices)) => devices,
            Some(other) => {
                warn!("DeviceList.Devices is not an array: {other}");
                Vec::new()
            }
            None => {
                warn!("DeviceList payload has no Devices field");
                Vec::new()
            }
        },
        other => {
            warn!("DeviceList payload is not an object: {other}");
            Vec::new()
        }
    }
}

fn u32_field(payload: &Value, field: &str) -> Option<u32> {
    payload
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
}
