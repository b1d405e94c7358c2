use crate::domain::DiscoveredSession;
use farkle_session_core::{AdvanceReason, DeviceId};
use uuid::Uuid;

/// Events published for UI observers
///
/// The session loop never calls back into the UI; observers subscribe to a
/// channel of these instead.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Browsing surfaced a joinable session
    SessionDiscovered(DiscoveredSession),

    /// A peer completed the handshake (host side)
    PeerJoined {
        device_id: DeviceId,
        display_name: String,
    },

    /// A peer is gone for good (grace period expired)
    PeerLeft { device_id: DeviceId },

    /// We completed the handshake with the host (client side)
    Established,

    /// The mirrored or authoritative state changed; re-render
    StateUpdated,

    RoundStarted { number: u32 },

    RoundForced { reason: AdvanceReason },

    GameOver { winner: Option<Uuid> },

    /// The pending-resync UI flag flipped
    ResyncPending(bool),

    /// A locally originated action was dropped by validation
    ActionRejected { reason: String },
}
