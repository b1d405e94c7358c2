use crate::domain::{AdvanceReason, DeviceId, GameConfig, TurnProgress, TurnSubmission};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commands that can be executed against the round coordinator
///
/// Serializable because the legacy fallback path ships host commands over
/// the wire; the simultaneous-turn path uses the dedicated wire messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameCommand {
    /// Add a player controlled by the given device (lobby phase only)
    AddPlayer { name: String, device_id: DeviceId },

    /// Reassign a player to a different device
    AssignDevice { player_id: Uuid, device_id: DeviceId },

    /// Replace the rule configuration
    UpdateConfig { config: GameConfig },

    /// Begin round 1
    StartGame,

    /// Host override: begin the next round immediately
    StartNewRound,

    /// Apply a submitted turn outcome
    SubmitTurn { submission: TurnSubmission },

    /// Record a live spectator snapshot for an in-progress turn
    NoteTurnProgress {
        player_id: Uuid,
        device_id: DeviceId,
        progress: TurnProgress,
    },

    /// Skip one player's turn
    SkipPlayer { player_id: Uuid },

    /// Skip every player still owing a turn and close the round
    ForceAdvance { reason: AdvanceReason },

    /// A device dropped; skip its assigned players
    DeviceDisconnected { device_id: DeviceId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TurnOutcome, TurnSubmission};

    #[test]
    fn test_command_round_trips_through_json() {
        let cmd = GameCommand::SubmitTurn {
            submission: TurnSubmission::new(
                Uuid::new_v4(),
                DeviceId::generate(),
                TurnOutcome::banked(400),
            ),
        };

        let json = serde_json::to_string(&cmd).unwrap();
        let back: GameCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
    }

    #[test]
    fn test_command_debug_names_variant() {
        let cmd = GameCommand::ForceAdvance {
            reason: AdvanceReason::TurnTimeout,
        };
        let debug = format!("{:?}", cmd);
        assert!(debug.contains("ForceAdvance"));
    }
}
