pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod session;


pub const INTIFACE_DEFAULT_HOST: &str = "127.0.0.1";
pub const INTIFACE_DEFAULT_PORT: u16 = 12345;
pub const INTIFACE_DEFAULT_ENDPOINT: &str =
    const_format::concatcp!("ws://", INTIFACE_DEFAULT_HOST, ":", INTIFACE_DEFAULT_PORT);

/// Sub-protocol identifier Intiface Central requires in `Sec-WebSocket-Protocol`.
pub const BUTTPLUG_SUBPROTOCOL: &str = "buttplug-json";

/// Buttplug message spec version this client speaks.
pub const MESSAGE_VERSION: u32 = 3;

pub const DEFAULT_CLIENT_NAME: &str = "StreamConnector";
