use crate::error::P2PError;
use farkle_session_core::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Short human-readable join code identifying one session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionCode(String);

impl SessionCode {
    const LENGTH: usize = 6;

    /// Generate a fresh code
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(hex[..Self::LENGTH].to_string())
    }

    /// Parse a code typed or scanned by a user
    pub fn parse(s: &str) -> Result<Self, P2PError> {
        let code = s.trim().to_uppercase();
        if code.is_empty() || code.len() > 8 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(P2PError::InvalidSessionCode(s.to_string()));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata a host advertises while its session is joinable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_code: SessionCode,
    pub host_device_id: DeviceId,
    pub display_name: String,
    pub protocol_version: u16,
    pub player_count: u32,
}

/// A session seen while browsing, before any connection exists
///
/// Ephemeral: produced by the discovery sub-layer and discarded when the
/// browse ends or the session disappears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredSession {
    pub peer_id: crate::domain::PeerId,
    pub host_device_id: DeviceId,
    pub display_name: String,
    pub session_code: SessionCode,
    pub player_count: u32,
    pub protocol_version: u16,
}
