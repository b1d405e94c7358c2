use crate::domain::PeerId;
use crate::protocol::HandshakePhase;
use farkle_session_core::DeviceId;
use instant::{Duration, Instant};
use std::collections::HashMap;

/// Connection status of a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Peer is connected and responsive
    Connected,
    /// Peer disconnected, but within grace period
    Disconnected { since: Instant },
    /// Grace period expired, peer is considered gone
    TimedOut,
}

/// State tracking for one connected peer
#[derive(Debug, Clone)]
pub struct PeerState {
    /// When this peer connected
    pub connected_at: Instant,
    /// Last time we received any message from this peer (pings included)
    pub last_seen: Instant,
    pub status: ConnectionStatus,
    /// Where the peer is in the handshake; gameplay messages from anything
    /// short of `Established` are dropped
    pub handshake: HandshakePhase,
    /// Stable identity learned from the Greeting (if completed)
    pub device_id: Option<DeviceId>,
    pub display_name: Option<String>,
}

impl PeerState {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            connected_at: now,
            last_seen: now,
            status: ConnectionStatus::Connected,
            handshake: HandshakePhase::AwaitingGreeting,
            device_id: None,
            display_name: None,
        }
    }

    pub fn update_last_seen(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Complete the handshake with the peer's identity
    pub fn mark_established(&mut self, device_id: DeviceId, display_name: String) {
        self.handshake = HandshakePhase::Established;
        self.device_id = Some(device_id);
        self.display_name = Some(display_name);
    }

    pub fn is_established(&self) -> bool {
        self.handshake == HandshakePhase::Established
    }

    pub fn mark_disconnected(&mut self) {
        self.status = ConnectionStatus::Disconnected {
            since: Instant::now(),
        };
    }

    /// Check if the grace period has expired, transitioning to `TimedOut`
    pub fn check_grace_period(&mut self, grace_period: Duration) -> bool {
        match self.status {
            ConnectionStatus::Disconnected { since } => {
                if since.elapsed() >= grace_period {
                    self.status = ConnectionStatus::TimedOut;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self.status, ConnectionStatus::TimedOut)
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::Disconnected { .. } | ConnectionStatus::TimedOut
        )
    }
}

impl Default for PeerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Manages state for all connected peers
#[derive(Debug)]
pub struct PeerRegistry {
    peers: HashMap<PeerId, PeerState>,
    grace_period: Duration,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::with_grace_period(Duration::from_secs(30))
    }

    pub fn with_grace_period(grace_period: Duration) -> Self {
        Self {
            peers: HashMap::new(),
            grace_period,
        }
    }

    pub fn add_peer(&mut self, peer_id: PeerId) {
        self.peers.insert(peer_id, PeerState::new());
    }

    /// Mark a peer as disconnected (starts the grace period)
    pub fn mark_peer_disconnected(&mut self, peer_id: &PeerId) {
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.mark_disconnected();
        }
    }

    /// Remove a peer completely (after timeout)
    pub fn remove_peer(&mut self, peer_id: &PeerId) -> Option<PeerState> {
        self.peers.remove(peer_id)
    }

    pub fn get_peer(&self, peer_id: &PeerId) -> Option<&PeerState> {
        self.peers.get(peer_id)
    }

    pub fn get_peer_mut(&mut self, peer_id: &PeerId) -> Option<&mut PeerState> {
        self.peers.get_mut(peer_id)
    }

    pub fn update_last_seen(&mut self, peer_id: &PeerId) {
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.update_last_seen();
        }
    }

    pub fn is_established(&self, peer_id: &PeerId) -> bool {
        self.peers
            .get(peer_id)
            .map(|peer| peer.is_established() && !peer.is_timed_out())
            .unwrap_or(false)
    }

    /// Peers that completed the handshake and are still live
    pub fn established_peers(&self) -> Vec<PeerId> {
        self.peers
            .iter()
            .filter(|(_, state)| state.is_established() && !state.is_disconnected())
            .map(|(peer_id, _)| *peer_id)
            .collect()
    }

    /// Check all disconnected peers for grace period expiration.
    /// Returns the peers that have just timed out.
    pub fn check_grace_periods(&mut self) -> Vec<PeerId> {
        let mut timed_out = Vec::new();

        for (peer_id, peer_state) in self.peers.iter_mut() {
            if peer_state.check_grace_period(self.grace_period) {
                timed_out.push(*peer_id);
            }
        }

        timed_out
    }

    /// Count of peers not yet timed out
    pub fn peer_count(&self) -> usize {
        self.peers
            .values()
            .filter(|state| !state.is_timed_out())
            .count()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_peer_awaits_greeting() {
        let state = PeerState::new();
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.handshake, HandshakePhase::AwaitingGreeting);
        assert!(!state.is_established());
    }

    #[test]
    fn test_mark_established_records_identity() {
        let mut state = PeerState::new();
        let device = DeviceId::generate();

        state.mark_established(device.clone(), "Alice's phone".to_string());

        assert!(state.is_established());
        assert_eq!(state.device_id, Some(device));
    }

    #[test]
    fn test_grace_period_expiry() {
        let mut state = PeerState::new();
        state.mark_disconnected();

        // Should not expire immediately
        assert!(!state.check_grace_period(Duration::from_secs(30)));
        assert!(!state.is_timed_out());

        // Zero grace period expires at once
        assert!(state.check_grace_period(Duration::from_millis(0)));
        assert!(state.is_timed_out());
    }

    #[test]
    fn test_registry_counts_exclude_timed_out() {
        let mut registry = PeerRegistry::with_grace_period(Duration::from_millis(0));
        let peer_id = PeerId::random();

        registry.add_peer(peer_id);
        assert_eq!(registry.peer_count(), 1);

        registry.mark_peer_disconnected(&peer_id);
        let timed_out = registry.check_grace_periods();

        assert_eq!(timed_out, vec![peer_id]);
        assert_eq!(registry.peer_count(), 0);
    }

    #[test]
    fn test_established_peers_excludes_unshaken() {
        let mut registry = PeerRegistry::new();
        let greeted = PeerId::random();
        let silent = PeerId::random();

        registry.add_peer(greeted);
        registry.add_peer(silent);
        registry
            .get_peer_mut(&greeted)
            .unwrap()
            .mark_established(DeviceId::generate(), "Greeted".to_string());

        assert_eq!(registry.established_peers(), vec![greeted]);
        assert!(registry.is_established(&greeted));
        assert!(!registry.is_established(&silent));
    }

    #[test]
    fn test_disconnected_peer_not_in_established_list() {
        let mut registry = PeerRegistry::new();
        let peer_id = PeerId::random();

        registry.add_peer(peer_id);
        registry
            .get_peer_mut(&peer_id)
            .unwrap()
            .mark_established(DeviceId::generate(), "Peer".to_string());
        registry.mark_peer_disconnected(&peer_id);

        assert!(registry.established_peers().is_empty());
    }
}
