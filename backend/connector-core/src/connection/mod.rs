//! WebSocket transport to Intiface Central.
//!
//! [`transport::connect`] opens the socket and negotiates the
//! `buttplug-json` sub-protocol; [`ConnectionDriver`] runs one [`Session`]
//! over it until the peer closes, the network fails or the caller cancels.
//!
//! The driver never reconnects. Callers that want to retry build a fresh
//! driver (and with it a fresh session) per attempt.
//!
//! [`Session`]: crate::session::Session

mod driver;
pub mod transport;

pub use driver::{ConnectionDriver, DriverExit};
pub use transport::IntifaceStream;
