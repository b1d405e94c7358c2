mod handshake;
mod message;

pub use handshake::{validate_greeting, HandshakeError, HandshakePhase};
pub use message::{WireMessage, PROTOCOL_VERSION};
