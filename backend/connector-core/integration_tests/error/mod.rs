mod connection;
mod frame;
mod session;
