use crate::domain::{DeviceId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The result of one completed local turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Points the player banked this turn (zero on a farkle)
    pub score_earned: u32,
    /// True when the turn ended with no scoring dice
    pub is_farkle: bool,
    /// Raw die faces of each roll taken, for validation and replay display
    #[serde(default)]
    pub roll_history: Vec<Vec<u8>>,
}

impl TurnOutcome {
    pub fn banked(score_earned: u32) -> Self {
        Self {
            score_earned,
            is_farkle: false,
            roll_history: Vec::new(),
        }
    }

    pub fn farkle() -> Self {
        Self {
            score_earned: 0,
            is_farkle: true,
            roll_history: Vec::new(),
        }
    }

    pub fn with_roll_history(mut self, rolls: Vec<Vec<u8>>) -> Self {
        self.roll_history = rolls;
        self
    }
}

/// A turn outcome submitted to the host, created by the device controlling
/// the player and consumed exactly once by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSubmission {
    pub player_id: Uuid,
    pub submitting_device_id: DeviceId,
    pub outcome: TurnOutcome,
    pub timestamp: Timestamp,
}

impl TurnSubmission {
    pub fn new(player_id: Uuid, submitting_device_id: DeviceId, outcome: TurnOutcome) -> Self {
        Self {
            player_id,
            submitting_device_id,
            outcome,
            timestamp: Timestamp::now(),
        }
    }
}

/// An applied submission, as recorded in the round state
///
/// Carries the resulting totals so clients can fold it into their mirror
/// idempotently: applying the same record twice assigns the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedResult {
    pub player_id: Uuid,
    pub outcome: TurnOutcome,
    pub new_total: u32,
    pub round_score: u32,
    pub eligible_after: bool,
    pub farkle_streak_after: u8,
}

/// Live snapshot of an in-progress turn, for spectator display only
///
/// Sent best-effort; the host keeps the latest one per player and clears it
/// when the turn is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnProgress {
    pub current_roll: Vec<u8>,
    pub selected_dice: Vec<u8>,
    pub running_score: u32,
    pub roll_count: u32,
    pub remaining_dice: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farkle_outcome_earns_nothing() {
        let outcome = TurnOutcome::farkle();
        assert!(outcome.is_farkle);
        assert_eq!(outcome.score_earned, 0);
    }

    #[test]
    fn test_submission_carries_device() {
        let device = DeviceId::generate();
        let sub = TurnSubmission::new(Uuid::new_v4(), device.clone(), TurnOutcome::banked(350));

        assert_eq!(sub.submitting_device_id, device);
        assert_eq!(sub.outcome.score_earned, 350);
    }

    #[test]
    fn test_submission_round_trips_through_json() {
        let sub = TurnSubmission::new(
            Uuid::new_v4(),
            DeviceId::generate(),
            TurnOutcome::banked(600).with_roll_history(vec![vec![1, 1, 5, 2, 3, 4]]),
        );

        let json = serde_json::to_vec(&sub).unwrap();
        let back: TurnSubmission = serde_json::from_slice(&json).unwrap();
        assert_eq!(sub, back);
    }
}
