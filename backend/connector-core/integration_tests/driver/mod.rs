mod failure;
mod handshake;
mod registry;
