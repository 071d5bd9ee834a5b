pub mod config;
pub mod connection;
pub mod frame;
pub mod session;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    Frame(#[from] frame::FrameError),

    #[error(transparent)]
    Session(#[from] session::SessionError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
