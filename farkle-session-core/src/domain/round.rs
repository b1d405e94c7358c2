use crate::domain::{SubmittedResult, Timestamp, TurnStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle phase of the game, strictly host-driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Gathering players, game not started
    Setup,
    /// A round is being played
    InProgress,
    /// Every player has a terminal status for this round
    Complete,
    /// Final round finished, scores are final
    GameOver,
}

/// The authoritative round state
///
/// A single instance lives on the host; clients receive full copies through
/// replication and never mutate them except via snapshot application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Monotonically increasing, starts at 1 when the game starts
    pub round_number: u32,
    pub phase: RoundPhase,
    pub turn_statuses: HashMap<Uuid, TurnStatus>,
    pub submitted_results: Vec<SubmittedResult>,
    pub is_final_round: bool,
    /// Player whose banked total first met the winning threshold
    pub final_round_trigger: Option<Uuid>,
    /// Host-side time of the last mutation, for snapshot staleness checks
    pub timestamp: Timestamp,
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            round_number: 0,
            phase: RoundPhase::Setup,
            turn_statuses: HashMap::new(),
            submitted_results: Vec::new(),
            is_final_round: false,
            final_round_trigger: None,
            timestamp: Timestamp::now(),
        }
    }

    pub fn status(&self, player_id: &Uuid) -> Option<TurnStatus> {
        self.turn_statuses.get(player_id).copied()
    }

    /// True iff every tracked player's status is terminal
    pub fn all_submitted(&self) -> bool {
        !self.turn_statuses.is_empty()
            && self.turn_statuses.values().all(|status| status.is_terminal())
    }

    /// Reset per-round fields for the given roster and bump the round number
    pub(crate) fn begin_round(&mut self, roster: impl Iterator<Item = Uuid>) {
        self.round_number += 1;
        self.phase = RoundPhase::InProgress;
        self.submitted_results.clear();
        self.turn_statuses = roster.map(|id| (id, TurnStatus::Pending)).collect();
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.timestamp = Timestamp::now();
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_setup() {
        let state = RoundState::new();
        assert_eq!(state.phase, RoundPhase::Setup);
        assert_eq!(state.round_number, 0);
        assert!(!state.is_final_round);
    }

    #[test]
    fn test_all_submitted_requires_players() {
        let state = RoundState::new();
        // No players tracked yet
        assert!(!state.all_submitted());
    }

    #[test]
    fn test_all_submitted_counts_skips() {
        let mut state = RoundState::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        state.turn_statuses.insert(a, TurnStatus::Submitted);
        state.turn_statuses.insert(b, TurnStatus::Skipped);

        assert!(state.all_submitted());

        state.turn_statuses.insert(b, TurnStatus::Pending);
        assert!(!state.all_submitted());
    }

    #[test]
    fn test_begin_round_resets_everything() {
        let mut state = RoundState::new();
        let players = [Uuid::new_v4(), Uuid::new_v4()];

        state.begin_round(players.iter().copied());
        state.turn_statuses.insert(players[0], TurnStatus::Submitted);

        state.begin_round(players.iter().copied());

        assert_eq!(state.round_number, 2);
        assert!(state.submitted_results.is_empty());
        for id in &players {
            assert_eq!(state.status(id), Some(TurnStatus::Pending));
        }
    }

    #[test]
    fn test_round_state_serialization() {
        let mut state = RoundState::new();
        state.begin_round([Uuid::new_v4()].into_iter());

        let json = serde_json::to_string(&state).unwrap();
        let back: RoundState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
