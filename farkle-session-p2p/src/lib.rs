// Domain layer (core)
pub mod domain;

// Application layer (use cases)
pub mod application;

// Infrastructure layer (adapters)
pub mod infrastructure;

// Wire protocol
pub mod protocol;

pub mod error;

// Re-exports for convenience
pub use application::{
    ClientCommand, ClientSessionLoop, HostCommand, HostSessionLoop, ClientMirror, MirroredStatus,
    ReconnectPolicy, ReconnectState, ResyncTracker, SessionConfig, SessionEvent,
    SnapshotBroadcaster, StatusSource,
};
#[cfg(feature = "native")]
pub use application::{SessionDriver, SessionRuntime};
pub use domain::{
    DiscoveredSession, PeerDeviceMap, PeerId, PeerRegistry, PeerState, SessionCode,
    SessionMetadata,
};
pub use error::{P2PError, Result};
pub use infrastructure::{DeliveryMode, Transport, TransportEvent};
pub use protocol::{HandshakePhase, HandshakeError, WireMessage, PROTOCOL_VERSION};
