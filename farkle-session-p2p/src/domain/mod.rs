mod device_map;
mod discovery;
mod peer;
mod peer_registry;

pub use device_map::PeerDeviceMap;
pub use discovery::{DiscoveredSession, SessionCode, SessionMetadata};
pub use peer::PeerId;
pub use peer_registry::{ConnectionStatus, PeerRegistry, PeerState};
