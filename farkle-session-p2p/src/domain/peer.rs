use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transport-level peer handle
///
/// Assigned by the transport adapter per session; a device that reconnects
/// may come back under a different handle. Stable identity lives in
/// `DeviceId`, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(Uuid);

impl PeerId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh handle (transport adapters and tests)
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PeerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
