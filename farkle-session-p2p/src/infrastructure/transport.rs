use crate::domain::{DiscoveredSession, PeerId, SessionMetadata};
use crate::error::Result;

/// Delivery quality requested for one send
///
/// Handshake, round-state snapshots, turn submissions and lifecycle events
/// go `Reliable`; turn-progress spectating updates and connection-health
/// pings go `BestEffort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Reliable,
    BestEffort,
}

/// Events surfaced by the transport adapter
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A raw connection came up (handshake has not happened yet)
    PeerConnected(PeerId),

    /// A connection dropped
    PeerDisconnected(PeerId),

    /// Bytes arrived from a peer
    MessageReceived { from: PeerId, data: Vec<u8> },

    /// Browsing surfaced a joinable session
    SessionDiscovered(DiscoveredSession),
}

/// The point-to-point transport, an external primitive
///
/// Discovery, session establishment and datagram delivery are someone
/// else's problem; this layer only consumes the contract. Implementations
/// must be poll-driven and non-blocking: the session loop calls
/// `poll_events` from its single thread and never waits on a peer.
pub trait Transport {
    /// Our own handle on this transport
    fn local_peer_id(&self) -> PeerId;

    /// Advertise a joinable session (host). Calling again replaces the
    /// advertised metadata (e.g. updated player count).
    fn start_advertising(&mut self, metadata: SessionMetadata) -> Result<()>;

    fn stop_advertising(&mut self) -> Result<()>;

    /// Start browsing for sessions; results arrive as
    /// `TransportEvent::SessionDiscovered`
    fn start_browsing(&mut self) -> Result<()>;

    /// Open a connection to a peer; completion arrives as
    /// `TransportEvent::PeerConnected`
    fn connect(&mut self, peer: PeerId) -> Result<()>;

    /// Peers with a live raw connection
    fn connected_peers(&self) -> Vec<PeerId>;

    fn send_to(&mut self, peer: PeerId, data: Vec<u8>, mode: DeliveryMode) -> Result<()>;

    /// Send to every connected peer
    fn broadcast(&mut self, data: Vec<u8>, mode: DeliveryMode) -> Result<()>;

    /// Drain pending transport events
    fn poll_events(&mut self) -> Vec<TransportEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_mode_equality() {
        assert_eq!(DeliveryMode::Reliable, DeliveryMode::Reliable);
        assert_ne!(DeliveryMode::Reliable, DeliveryMode::BestEffort);
    }

    #[test]
    fn test_transport_event_carries_payload() {
        let from = PeerId::random();
        let event = TransportEvent::MessageReceived {
            from,
            data: b"hello".to_vec(),
        };

        match event {
            TransportEvent::MessageReceived { from: got, data } => {
                assert_eq!(got, from);
                assert_eq!(data, b"hello");
            }
            _ => panic!("Expected MessageReceived"),
        }
    }
}
