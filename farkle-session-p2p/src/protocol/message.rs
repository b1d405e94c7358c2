use crate::domain::SessionCode;
use crate::error::Result;
use crate::infrastructure::DeliveryMode;
use farkle_session_core::{
    AdvanceReason, DeviceId, GameConfig, PlayerRecord, RoundState, TurnProgress, TurnSubmission,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Wire protocol version; peers with a different version cannot join
pub const PROTOCOL_VERSION: u16 = 1;

/// Everything that crosses the wire, serialized as self-describing JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Client → host on raw connect: who we are and what we want to join
    Greeting {
        device_id: DeviceId,
        display_name: String,
        protocol_version: u16,
        session_code: SessionCode,
    },

    /// Host → client on accepted greeting (and on every full resync):
    /// the complete session state, adopted wholesale
    Welcome {
        host_device_id: DeviceId,
        config: GameConfig,
        roster: Vec<PlayerRecord>,
        /// Roster order, since the roster vec already carries it implicitly
        /// but assignments do not
        assignments: HashMap<Uuid, DeviceId>,
        round_state: RoundState,
        protocol_version: u16,
    },

    /// Client → host: stale or foregrounded, send a fresh Welcome
    RequestFullSync,

    /// Host → all: full authoritative round state
    RoundStateSnapshot { state: RoundState },

    /// Client → host: a completed local turn
    TurnSubmission { submission: TurnSubmission },

    /// Live turn snapshot for spectators (best-effort, host relays)
    TurnProgress {
        player_id: Uuid,
        device_id: DeviceId,
        progress: TurnProgress,
    },

    /// Host → all: the round was advanced without waiting for everyone
    ForceAdvance { reason: AdvanceReason },

    /// Host → all: a new round began
    RoundStarted { number: u32 },

    /// Connection health (best-effort)
    Ping,
    Pong,

    // Legacy single-shot actions, retained only for the non-simultaneous
    // fallback mode
    Roll { player_id: Uuid, dice: Vec<u8> },
    SelectDice { player_id: Uuid, dice: Vec<u8> },
    BankTurn { player_id: Uuid, score: u32 },
    SkipTurn { player_id: Uuid },
}

impl WireMessage {
    /// Delivery quality this message requires
    pub fn delivery_mode(&self) -> DeliveryMode {
        match self {
            WireMessage::TurnProgress { .. } | WireMessage::Ping | WireMessage::Pong => {
                DeliveryMode::BestEffort
            }
            _ => DeliveryMode::Reliable,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
