use farkle_session_p2p::error::{P2PError, Result};
use farkle_session_p2p::{
    DeliveryMode, DiscoveredSession, PeerId, SessionMetadata, Transport, TransportEvent,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Shared in-memory network bus connecting every `MemoryTransport`
///
/// Simulates the point-to-point transport for tests: synchronous lossless
/// delivery, explicit connect, an advertising board for discovery, and an
/// offline switch per peer to simulate backgrounded devices.
#[derive(Default)]
pub struct MemoryHub {
    inboxes: HashMap<PeerId, Arc<Mutex<VecDeque<TransportEvent>>>>,
    advertised: HashMap<PeerId, SessionMetadata>,
    browsing: HashSet<PeerId>,
    offline: HashSet<PeerId>,
}

impl MemoryHub {
    /// Suppress all delivery to a peer (device went to the background)
    pub fn set_offline(hub: &Arc<Mutex<MemoryHub>>, peer: PeerId, offline: bool) {
        let mut hub = hub.lock().unwrap();
        if offline {
            hub.offline.insert(peer);
        } else {
            hub.offline.remove(&peer);
        }
    }

    fn push(&self, target: &PeerId, event: TransportEvent) {
        if self.offline.contains(target) {
            return;
        }
        if let Some(inbox) = self.inboxes.get(target) {
            inbox.lock().unwrap().push_back(event);
        }
    }

    fn discovered(metadata: &SessionMetadata, peer_id: PeerId) -> DiscoveredSession {
        DiscoveredSession {
            peer_id,
            host_device_id: metadata.host_device_id.clone(),
            display_name: metadata.display_name.clone(),
            session_code: metadata.session_code.clone(),
            player_count: metadata.player_count,
            protocol_version: metadata.protocol_version,
        }
    }
}

/// Create a hub shared between all transports of one test
pub fn create_hub() -> Arc<Mutex<MemoryHub>> {
    Arc::new(Mutex::new(MemoryHub::default()))
}

/// One peer's view of the in-memory network
///
/// Cloning yields another handle to the same peer, so tests can keep one
/// for link manipulation after moving the original into a session loop.
#[derive(Clone)]
pub struct MemoryTransport {
    local: PeerId,
    hub: Arc<Mutex<MemoryHub>>,
    inbox: Arc<Mutex<VecDeque<TransportEvent>>>,
}

impl MemoryTransport {
    pub fn new(hub: Arc<Mutex<MemoryHub>>) -> Self {
        let local = PeerId::random();
        let inbox = Arc::new(Mutex::new(VecDeque::new()));
        hub.lock().unwrap().inboxes.insert(local, inbox.clone());
        Self { local, hub, inbox }
    }

    /// Simulate an unexpected link drop between us and a peer: both sides
    /// observe a disconnect
    pub fn drop_link(&self, peer: PeerId) {
        let hub = self.hub.lock().unwrap();
        hub.push(&peer, TransportEvent::PeerDisconnected(self.local));
        hub.push(&self.local, TransportEvent::PeerDisconnected(peer));
    }
}

impl Transport for MemoryTransport {
    fn local_peer_id(&self) -> PeerId {
        self.local
    }

    fn start_advertising(&mut self, metadata: SessionMetadata) -> Result<()> {
        let mut hub = self.hub.lock().unwrap();
        hub.advertised.insert(self.local, metadata.clone());

        // Everyone already browsing learns about us right away
        let browsing: Vec<PeerId> = hub.browsing.iter().copied().collect();
        for peer in browsing {
            if peer != self.local {
                let discovered = MemoryHub::discovered(&metadata, self.local);
                hub.push(&peer, TransportEvent::SessionDiscovered(discovered));
            }
        }
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<()> {
        self.hub.lock().unwrap().advertised.remove(&self.local);
        Ok(())
    }

    fn start_browsing(&mut self) -> Result<()> {
        let mut hub = self.hub.lock().unwrap();
        hub.browsing.insert(self.local);

        // Deliver the current advertising board
        let sessions: Vec<(PeerId, SessionMetadata)> = hub
            .advertised
            .iter()
            .filter(|(peer, _)| **peer != self.local)
            .map(|(peer, metadata)| (*peer, metadata.clone()))
            .collect();
        for (peer, metadata) in sessions {
            let discovered = MemoryHub::discovered(&metadata, peer);
            hub.push(&self.local, TransportEvent::SessionDiscovered(discovered));
        }
        Ok(())
    }

    fn connect(&mut self, peer: PeerId) -> Result<()> {
        let hub = self.hub.lock().unwrap();
        if !hub.inboxes.contains_key(&peer) {
            return Err(P2PError::PeerNotFound(peer.to_string()));
        }

        hub.push(&peer, TransportEvent::PeerConnected(self.local));
        hub.push(&self.local, TransportEvent::PeerConnected(peer));
        Ok(())
    }

    fn connected_peers(&self) -> Vec<PeerId> {
        let hub = self.hub.lock().unwrap();
        hub.inboxes
            .keys()
            .filter(|peer| **peer != self.local)
            .copied()
            .collect()
    }

    fn send_to(&mut self, peer: PeerId, data: Vec<u8>, _mode: DeliveryMode) -> Result<()> {
        let hub = self.hub.lock().unwrap();
        if !hub.inboxes.contains_key(&peer) {
            return Err(P2PError::PeerNotFound(peer.to_string()));
        }

        // Offline peers silently miss traffic (radio silence, not an error)
        hub.push(
            &peer,
            TransportEvent::MessageReceived {
                from: self.local,
                data,
            },
        );
        Ok(())
    }

    fn broadcast(&mut self, data: Vec<u8>, mode: DeliveryMode) -> Result<()> {
        let peers = self.connected_peers();
        for peer in peers {
            self.send_to(peer, data.clone(), mode)?;
        }
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        self.inbox.lock().unwrap().drain(..).collect()
    }
}
