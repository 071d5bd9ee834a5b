//! Types shared by the Stream Connector crates.
//!
//! - **common** (this crate): error locations and boundary payloads
//! - **connector-core**: the Intiface protocol client
//! - **stream-connector**: application wiring (logging, config, reconnects)

pub mod error;
pub mod sensation;


pub use error::error_location::ErrorLocation;
pub use error::sensation_error::SensationError;
pub use sensation::SensationRequest;
