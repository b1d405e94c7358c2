use crate::domain::PeerId;
use farkle_session_core::DeviceId;
use std::collections::HashMap;

/// Enforces 1:1 bidirectional mapping between transport peer handles and
/// stable device identities
///
/// A device that reconnects under a new peer handle simply re-registers;
/// the stale handle's mapping is evicted so lookups never go through a dead
/// connection. An unknown handle resolves to `None`, never an error.
#[derive(Debug, Default, Clone)]
pub struct PeerDeviceMap {
    peer_to_device: HashMap<PeerId, DeviceId>,
    device_to_peer: HashMap<DeviceId, PeerId>,
}

impl PeerDeviceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer-device mapping (enforces 1:1)
    ///
    /// If either side was already mapped to something else, those old
    /// mappings are removed first.
    pub fn register(&mut self, peer_id: PeerId, device_id: DeviceId) {
        if let Some(old_device) = self.peer_to_device.get(&peer_id) {
            self.device_to_peer.remove(old_device);
        }
        if let Some(old_peer) = self.device_to_peer.get(&device_id) {
            self.peer_to_device.remove(old_peer);
        }

        self.peer_to_device.insert(peer_id, device_id.clone());
        self.device_to_peer.insert(device_id, peer_id);
    }

    /// Remove mapping for a peer, returning the device if it existed
    pub fn remove_by_peer(&mut self, peer_id: &PeerId) -> Option<DeviceId> {
        let device_id = self.peer_to_device.remove(peer_id)?;
        self.device_to_peer.remove(&device_id);
        Some(device_id)
    }

    /// Remove mapping for a device, returning the peer handle if it existed
    pub fn remove_by_device(&mut self, device_id: &DeviceId) -> Option<PeerId> {
        let peer_id = self.device_to_peer.remove(device_id)?;
        self.peer_to_device.remove(&peer_id);
        Some(peer_id)
    }

    /// Resolve the stable identity behind a transport handle
    pub fn device_for(&self, peer_id: &PeerId) -> Option<&DeviceId> {
        self.peer_to_device.get(peer_id)
    }

    /// Resolve the current transport handle of a device
    pub fn peer_for(&self, device_id: &DeviceId) -> Option<PeerId> {
        self.device_to_peer.get(device_id).copied()
    }

    pub fn contains_peer(&self, peer_id: &PeerId) -> bool {
        self.peer_to_device.contains_key(peer_id)
    }

    pub fn contains_device(&self, device_id: &DeviceId) -> bool {
        self.device_to_peer.contains_key(device_id)
    }

    pub fn all_peers(&self) -> impl Iterator<Item = &PeerId> {
        self.peer_to_device.keys()
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(
            self.peer_to_device.len(),
            self.device_to_peer.len(),
            "Bidirectional map invariant violated"
        );
        self.peer_to_device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peer_to_device.is_empty()
    }

    pub fn clear(&mut self) {
        self.peer_to_device.clear();
        self.device_to_peer.clear();
    }
}
