use serde_json::{Map, Value};

const DEVICE_INDEX_FIELD: &str = "DeviceIndex";
const DEVICE_NAME_FIELD: &str = "DeviceName";
const DEVICE_MESSAGES_FIELD: &str = "DeviceMessages";

/// One controllable peripheral as announced by the server.
///
/// Descriptors are replaced wholesale on re-announcement and never edited in
/// place, so the registry hands out shared references or clones only.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    index: u32,
    name: String,
    capabilities: Map<String, Value>,
    raw: Value,
}

impl DeviceDescriptor {
    /// Build a descriptor from a `DeviceList` entry or `DeviceAdded` payload.
    ///
    /// Returns `None` when `DeviceIndex` is missing or not a `u32`; the
    /// capability map is passed through as-is and `raw` keeps the full payload.
    pub fn from_payload(payload: Value) -> Option<Self> {
        let index = payload
            .get(DEVICE_INDEX_FIELD)
            .and_then(Value::as_u64)
            .and_then(|index| u32::try_from(index).ok())?;

        let name = payload
            .get(DEVICE_NAME_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let capabilities = payload
            .get(DEVICE_MESSAGES_FIELD)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Some(Self {
            index,
            name,
            capabilities,
            raw: payload,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability class name (`ScalarCmd`, `SensorReadCmd`, ...) to its metadata.
    pub fn capabilities(&self) -> &Map<String, Value> {
        &self.capabilities
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}
