use crate::domain::{
    DeviceId, GameConfig, PlayerRecord, RoundPhase, RoundState, ScoreEvaluator, SubmittedResult,
    TurnProgress, TurnStatus, TurnSubmission,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Why a round was advanced without waiting for every player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceReason {
    TurnTimeout,
    HostOverride,
    PlayerDisconnected,
}

impl fmt::Display for AdvanceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvanceReason::TurnTimeout => write!(f, "turn timeout"),
            AdvanceReason::HostOverride => write!(f, "host override"),
            AdvanceReason::PlayerDisconnected => write!(f, "player disconnected"),
        }
    }
}

/// Events emitted by the coordinator, drained by the session loop
///
/// `urgent` marks changes that must bypass the snapshot throttle (phase
/// transitions, final-round trigger, game over).
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    StateChanged { urgent: bool },
    RoundStarted { number: u32 },
    RoundForced { reason: AdvanceReason },
    /// Roster, assignments or config changed; peers need a fresh Welcome
    RosterChanged,
    GameOver { winner: Option<Uuid> },
}

/// Errors that can occur in coordinator operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CoordinatorError {
    #[error("Game needs at least one player")]
    NoPlayers,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Game is not in progress")]
    GameNotInProgress,

    #[error("Player not found: {0}")]
    PlayerNotFound(Uuid),

    #[error("Device {device_id} is not assigned to player {player_id}")]
    DeviceNotAssigned { player_id: Uuid, device_id: DeviceId },

    #[error("Player {0} already has a terminal turn status this round")]
    TurnAlreadyTaken(Uuid),

    #[error("Claimed outcome for player {0} is not attainable from its rolls")]
    ImplausibleOutcome(Uuid),

    #[error("Player name must be between 1 and 50 characters")]
    InvalidName,
}

/// Host-side round coordinator, the single authoritative source of truth
///
/// All mutations of roster, assignments and round state go through this
/// aggregate, serialized by the owning loop. Clients only ever see the
/// results through replication.
#[derive(Debug)]
pub struct RoundCoordinator {
    config: GameConfig,
    players: HashMap<Uuid, PlayerRecord>,
    /// Stable roster order, for display and deterministic winner selection
    turn_order: Vec<Uuid>,
    /// Which device may originate submissions for each player
    assignments: HashMap<Uuid, DeviceId>,
    round: RoundState,
    /// Latest spectator snapshot per player, cleared on submission
    spectate: HashMap<Uuid, TurnProgress>,
    events: Vec<CoordinatorEvent>,
}

impl RoundCoordinator {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            players: HashMap::new(),
            turn_order: Vec::new(),
            assignments: HashMap::new(),
            round: RoundState::new(),
            spectate: HashMap::new(),
            events: Vec::new(),
        }
    }

    // ===== Getters =====

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn players(&self) -> &HashMap<Uuid, PlayerRecord> {
        &self.players
    }

    pub fn player(&self, player_id: &Uuid) -> Option<&PlayerRecord> {
        self.players.get(player_id)
    }

    /// Players in stable roster order
    pub fn roster(&self) -> Vec<&PlayerRecord> {
        self.turn_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .collect()
    }

    pub fn assignments(&self) -> &HashMap<Uuid, DeviceId> {
        &self.assignments
    }

    pub fn assigned_device(&self, player_id: &Uuid) -> Option<&DeviceId> {
        self.assignments.get(player_id)
    }

    pub fn spectate_progress(&self, player_id: &Uuid) -> Option<&TurnProgress> {
        self.spectate.get(player_id)
    }

    /// Player with the highest banked total, ties broken by roster order
    pub fn winner(&self) -> Option<&PlayerRecord> {
        let mut best: Option<&PlayerRecord> = None;
        for id in &self.turn_order {
            if let Some(player) = self.players.get(id) {
                if best.map(|b| player.total_score > b.total_score).unwrap_or(true) {
                    best = Some(player);
                }
            }
        }
        best
    }

    /// Drain pending coordinator events
    pub fn drain_events(&mut self) -> Vec<CoordinatorEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Roster Management =====

    /// Add a player before the game starts; `device_id` becomes the only
    /// device allowed to submit turns for them
    pub fn add_player(
        &mut self,
        name: String,
        device_id: DeviceId,
    ) -> Result<Uuid, CoordinatorError> {
        if self.round.phase != RoundPhase::Setup {
            return Err(CoordinatorError::GameAlreadyStarted);
        }
        if name.is_empty() || name.len() > 50 {
            return Err(CoordinatorError::InvalidName);
        }

        // Players start eligible when the opening rule is off
        let player = PlayerRecord::new(name, self.config.opening_threshold.is_none());
        let player_id = player.id;

        self.players.insert(player_id, player);
        self.turn_order.push(player_id);
        self.assignments.insert(player_id, device_id);
        self.events.push(CoordinatorEvent::RosterChanged);

        Ok(player_id)
    }

    /// Reassign a player to a different device (host action, e.g. after a
    /// player moves to a new device mid-session)
    pub fn assign_device(
        &mut self,
        player_id: Uuid,
        device_id: DeviceId,
    ) -> Result<(), CoordinatorError> {
        if !self.players.contains_key(&player_id) {
            return Err(CoordinatorError::PlayerNotFound(player_id));
        }

        self.assignments.insert(player_id, device_id);
        self.events.push(CoordinatorEvent::RosterChanged);
        Ok(())
    }

    /// Replace the rule configuration (lobby-time host action)
    pub fn update_config(&mut self, config: GameConfig) {
        self.config = config;
        self.round.touch();
        self.events.push(CoordinatorEvent::RosterChanged);
        self.events.push(CoordinatorEvent::StateChanged { urgent: true });
    }

    // ===== Round Lifecycle =====

    /// Start the game: round 1, every player pending
    pub fn start_game(&mut self) -> Result<(), CoordinatorError> {
        if self.round.phase != RoundPhase::Setup {
            return Err(CoordinatorError::GameAlreadyStarted);
        }
        if self.players.is_empty() {
            return Err(CoordinatorError::NoPlayers);
        }

        tracing::info!("🎲 Game started with {} players", self.players.len());
        self.begin_next_round();
        Ok(())
    }

    /// Begin a fresh round: statuses reset, results cleared, number bumped
    pub fn start_new_round(&mut self) -> Result<(), CoordinatorError> {
        match self.round.phase {
            RoundPhase::InProgress | RoundPhase::Complete => {
                self.begin_next_round();
                Ok(())
            }
            _ => Err(CoordinatorError::GameNotInProgress),
        }
    }

    fn begin_next_round(&mut self) {
        for player in self.players.values_mut() {
            player.round_score = 0;
        }
        self.spectate.clear();
        self.round.begin_round(self.turn_order.iter().copied());

        tracing::info!("🔄 Round {} started", self.round.round_number);
        self.events.push(CoordinatorEvent::RoundStarted {
            number: self.round.round_number,
        });
        self.events.push(CoordinatorEvent::StateChanged { urgent: true });
    }

    // ===== Turn Submission =====

    /// Validate and apply a submitted turn outcome
    ///
    /// Rejections (unknown player, assignment mismatch, terminal status,
    /// implausible score) leave all state untouched; the caller logs and
    /// drops them without replying to the peer.
    pub fn handle_turn_submission(
        &mut self,
        sub: TurnSubmission,
        evaluator: &dyn ScoreEvaluator,
    ) -> Result<(), CoordinatorError> {
        let player_id = sub.player_id;

        if !self.players.contains_key(&player_id) {
            return Err(CoordinatorError::PlayerNotFound(player_id));
        }
        // Anti-spoofing: only the assigned device may submit for a player
        if self.assignments.get(&player_id) != Some(&sub.submitting_device_id) {
            tracing::warn!(
                "⚠️  Dropping submission for player {} from unassigned device {}",
                player_id,
                sub.submitting_device_id
            );
            return Err(CoordinatorError::DeviceNotAssigned {
                player_id,
                device_id: sub.submitting_device_id,
            });
        }
        if self.round.phase != RoundPhase::InProgress {
            return Err(CoordinatorError::GameNotInProgress);
        }
        match self.round.status(&player_id) {
            Some(status) if !status.is_terminal() => {}
            Some(_) => return Err(CoordinatorError::TurnAlreadyTaken(player_id)),
            None => return Err(CoordinatorError::PlayerNotFound(player_id)),
        }
        if !evaluator.validate_outcome(&sub.outcome) {
            tracing::warn!(
                "⚠️  Dropping implausible outcome for player {} (claimed {})",
                player_id,
                sub.outcome.score_earned
            );
            return Err(CoordinatorError::ImplausibleOutcome(player_id));
        }

        let mut urgent = false;
        let result = {
            let config = &self.config;
            let player = self
                .players
                .get_mut(&player_id)
                .expect("player presence checked above");

            let credited = if sub.outcome.is_farkle {
                player.consecutive_farkles += 1;
                if let Some(penalty) = config.triple_farkle_penalty {
                    if player.consecutive_farkles >= 3 {
                        player.total_score = player.total_score.saturating_sub(penalty);
                        player.consecutive_farkles = 0;
                        tracing::info!(
                            "💥 Player {} hit three farkles, penalty {} applied",
                            player.name,
                            penalty
                        );
                    }
                }
                0
            } else {
                let earned = sub.outcome.score_earned;
                let credited = if player.is_eligible {
                    earned
                } else {
                    match config.opening_threshold {
                        Some(threshold) if earned < threshold => {
                            tracing::info!(
                                "🚪 Player {} earned {} below opening threshold {}, discarded",
                                player.name,
                                earned,
                                threshold
                            );
                            0
                        }
                        _ => {
                            player.is_eligible = true;
                            earned
                        }
                    }
                };
                if credited > 0 {
                    player.total_score += credited;
                    player.consecutive_farkles = 0;
                }
                credited
            };
            player.round_score = credited;

            SubmittedResult {
                player_id,
                outcome: sub.outcome,
                new_total: player.total_score,
                round_score: player.round_score,
                eligible_after: player.is_eligible,
                farkle_streak_after: player.consecutive_farkles,
            }
        };

        // First total to meet the winning threshold enters the final round;
        // later crossings never re-trigger.
        if !self.round.is_final_round && result.new_total >= self.config.winning_score {
            self.round.is_final_round = true;
            self.round.final_round_trigger = Some(player_id);
            urgent = true;
            tracing::info!(
                "🏁 Final round: player {} reached {}",
                player_id,
                result.new_total
            );
        }

        self.round.submitted_results.push(result);
        self.round.turn_statuses.insert(player_id, TurnStatus::Submitted);
        self.spectate.remove(&player_id);
        self.round.touch();
        self.events.push(CoordinatorEvent::StateChanged { urgent });

        self.finish_round_if_complete();
        Ok(())
    }

    // ===== Spectating =====

    /// Record a live turn-progress snapshot; marks the player in-progress
    pub fn note_turn_progress(
        &mut self,
        player_id: Uuid,
        device_id: &DeviceId,
        progress: TurnProgress,
    ) -> Result<(), CoordinatorError> {
        if !self.players.contains_key(&player_id) {
            return Err(CoordinatorError::PlayerNotFound(player_id));
        }
        if self.assignments.get(&player_id) != Some(device_id) {
            return Err(CoordinatorError::DeviceNotAssigned {
                player_id,
                device_id: device_id.clone(),
            });
        }
        if self.round.phase != RoundPhase::InProgress {
            return Err(CoordinatorError::GameNotInProgress);
        }
        match self.round.status(&player_id) {
            Some(status) if !status.is_terminal() => {}
            _ => return Err(CoordinatorError::TurnAlreadyTaken(player_id)),
        }

        self.round
            .turn_statuses
            .insert(player_id, TurnStatus::InProgress);
        self.spectate.insert(player_id, progress);
        self.round.touch();
        self.events.push(CoordinatorEvent::StateChanged { urgent: false });
        Ok(())
    }

    // ===== Forced Advancement =====

    /// Skip a single player's turn (disconnects, legacy skip action).
    /// A no-op when the status is already terminal.
    pub fn skip_player(&mut self, player_id: Uuid) -> Result<(), CoordinatorError> {
        if self.round.phase != RoundPhase::InProgress {
            return Err(CoordinatorError::GameNotInProgress);
        }
        let status = self
            .round
            .turn_statuses
            .get_mut(&player_id)
            .ok_or(CoordinatorError::PlayerNotFound(player_id))?;

        if status.is_terminal() {
            return Ok(());
        }

        *status = TurnStatus::Skipped;
        self.spectate.remove(&player_id);
        self.round.touch();
        self.events.push(CoordinatorEvent::StateChanged { urgent: false });

        self.finish_round_if_complete();
        Ok(())
    }

    /// Skip everyone still pending/in-progress and close out the round
    pub fn force_advance_round(&mut self, reason: AdvanceReason) -> Result<(), CoordinatorError> {
        if self.round.phase != RoundPhase::InProgress {
            return Err(CoordinatorError::GameNotInProgress);
        }

        tracing::info!("⏭️  Forcing round advance: {}", reason);

        let stragglers: Vec<Uuid> = self
            .round
            .turn_statuses
            .iter()
            .filter(|(_, status)| !status.is_terminal())
            .map(|(id, _)| *id)
            .collect();

        for player_id in &stragglers {
            self.round
                .turn_statuses
                .insert(*player_id, TurnStatus::Skipped);
            self.spectate.remove(player_id);
        }

        self.round.touch();
        self.events.push(CoordinatorEvent::RoundForced { reason });
        self.events.push(CoordinatorEvent::StateChanged { urgent: true });

        self.finish_round_if_complete();
        Ok(())
    }

    /// A device dropped: skip its assigned players still owing a turn
    pub fn handle_device_disconnected(&mut self, device_id: &DeviceId) {
        if self.round.phase != RoundPhase::InProgress {
            return;
        }

        let affected: Vec<Uuid> = self
            .assignments
            .iter()
            .filter(|(_, assigned)| *assigned == device_id)
            .map(|(player_id, _)| *player_id)
            .collect();

        for player_id in affected {
            let owing = self
                .round
                .status(&player_id)
                .map(|status| !status.is_terminal())
                .unwrap_or(false);
            if owing {
                tracing::info!(
                    "🔌 Skipping player {} after device {} disconnected",
                    player_id,
                    device_id
                );
                let _ = self.skip_player(player_id);
            }
        }
    }

    // ===== Private Helper Methods =====

    /// Close the round once every status is terminal: end the game when the
    /// final round was active, otherwise roll straight into the next round.
    fn finish_round_if_complete(&mut self) {
        if self.round.phase != RoundPhase::InProgress || !self.round.all_submitted() {
            return;
        }

        self.round.phase = RoundPhase::Complete;
        self.round.touch();
        self.events.push(CoordinatorEvent::StateChanged { urgent: true });

        if self.round.is_final_round {
            self.round.phase = RoundPhase::GameOver;
            self.round.touch();
            let winner = self.winner().map(|p| p.id);
            tracing::info!("🏆 Game over, winner: {:?}", winner);
            self.events.push(CoordinatorEvent::GameOver { winner });
            self.events.push(CoordinatorEvent::StateChanged { urgent: true });
        } else {
            self.begin_next_round();
        }
    }
}
