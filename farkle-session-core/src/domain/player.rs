use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-player, per-round turn status
///
/// Once a player reaches `Submitted` or `Skipped` the status never reverts
/// within the same round; it resets to `Pending` only when a new round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStatus {
    /// Has not started their turn this round
    Pending,
    /// Currently rolling (spectators may be watching)
    InProgress,
    /// Outcome accepted by the host
    Submitted,
    /// Turn was skipped (disconnect, timeout, host override)
    Skipped,
}

impl TurnStatus {
    /// A terminal status counts toward round completion
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStatus::Submitted | TurnStatus::Skipped)
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnStatus::Pending => write!(f, "Pending"),
            TurnStatus::InProgress => write!(f, "InProgress"),
            TurnStatus::Submitted => write!(f, "Submitted"),
            TurnStatus::Skipped => write!(f, "Skipped"),
        }
    }
}

/// One player's scorekeeping record
///
/// Owned exclusively by the host's coordinator; clients hold read-only
/// mirrors updated through replication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub name: String,
    pub total_score: u32,
    /// Score credited in the current round (reset every round)
    pub round_score: u32,
    /// Whether the player has met the opening threshold and may bank points
    pub is_eligible: bool,
    pub consecutive_farkles: u8,
}

impl PlayerRecord {
    pub fn new(name: String, starts_eligible: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            total_score: 0,
            round_score: 0,
            is_eligible: starts_eligible,
            consecutive_farkles: 0,
        }
    }
}
