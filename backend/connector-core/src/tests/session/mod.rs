mod dispatch;
mod lifecycle;
mod state;

use crate::session::Session;

use serde_json::{Value, json};

pub(super) const TEST_CLIENT_NAME: &str = "StreamConnectorTest";

/// A session that has completed the handshake and sent its startup requests.
pub(super) fn active_session() -> Session {
    let mut session = Session::new(TEST_CLIENT_NAME);
    session.begin_handshake().unwrap();
    session.handle_frame(&frame(json!([{"ServerInfo": {"Id": 1, "ServerName": "Test Server", "MessageVersion": 3}}])));
    session
}

pub(super) fn frame(value: Value) -> String {
    value.to_string()
}

pub(super) fn device(index: u32, name: &str) -> Value {
    json!({
        "DeviceIndex": index,
        "DeviceName": name,
        "DeviceMessages": {"ScalarCmd": [{"StepCount": 20, "ActuatorType": "Vibrate"}]}
    })
}
