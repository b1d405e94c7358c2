use crate::application::{GameCommand, GameEvent};
use crate::domain::{GameConfig, RoundCoordinator, ScoreEvaluator};
use std::collections::VecDeque;

/// Single-writer command loop around the coordinator
///
/// Commands are queued and processed one at a time, so completion checks and
/// final-round triggering never race: whatever thread or task feeds the queue,
/// only `poll()` touches the coordinator.
pub struct GameLoop {
    coordinator: RoundCoordinator,
    evaluator: Box<dyn ScoreEvaluator + Send>,
    queue: VecDeque<GameCommand>,
    events: Vec<GameEvent>,
}

impl GameLoop {
    pub fn new(config: GameConfig, evaluator: Box<dyn ScoreEvaluator + Send>) -> Self {
        Self {
            coordinator: RoundCoordinator::new(config),
            evaluator,
            queue: VecDeque::new(),
            events: Vec::new(),
        }
    }

    /// Read-only view of the authoritative state
    pub fn coordinator(&self) -> &RoundCoordinator {
        &self.coordinator
    }

    /// Enqueue a command for the next poll
    pub fn submit(&mut self, command: GameCommand) {
        self.queue.push_back(command);
    }

    /// Process all queued commands; returns how many were executed
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;

        while let Some(command) = self.queue.pop_front() {
            processed += 1;
            if let Err(reason) = self.execute(command) {
                self.events.push(GameEvent::CommandRejected { reason });
            }
        }

        for event in self.coordinator.drain_events() {
            self.events.push(event.into());
        }

        processed
    }

    /// Drain events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn execute(&mut self, command: GameCommand) -> Result<(), String> {
        let result = match command {
            GameCommand::AddPlayer { name, device_id } => self
                .coordinator
                .add_player(name, device_id)
                .map(|_| ()),
            GameCommand::AssignDevice {
                player_id,
                device_id,
            } => self.coordinator.assign_device(player_id, device_id),
            GameCommand::UpdateConfig { config } => {
                self.coordinator.update_config(config);
                Ok(())
            }
            GameCommand::StartGame => self.coordinator.start_game(),
            GameCommand::StartNewRound => self.coordinator.start_new_round(),
            GameCommand::SubmitTurn { submission } => self
                .coordinator
                .handle_turn_submission(submission, self.evaluator.as_ref()),
            GameCommand::NoteTurnProgress {
                player_id,
                device_id,
                progress,
            } => self
                .coordinator
                .note_turn_progress(player_id, &device_id, progress),
            GameCommand::SkipPlayer { player_id } => self.coordinator.skip_player(player_id),
            GameCommand::ForceAdvance { reason } => self.coordinator.force_advance_round(reason),
            GameCommand::DeviceDisconnected { device_id } => {
                self.coordinator.handle_device_disconnected(&device_id);
                Ok(())
            }
        };

        result.map_err(|e| {
            tracing::warn!("❌ Command rejected: {}", e);
            e.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CoordinatorEvent, DeviceId, RoundPhase, TrustingEvaluator, TurnOutcome, TurnSubmission,
    };

    fn game_loop() -> GameLoop {
        GameLoop::new(
            GameConfig::default().without_opening_threshold(),
            Box::new(TrustingEvaluator),
        )
    }

    #[test]
    fn test_commands_execute_in_submission_order() {
        let mut game = game_loop();
        let device = DeviceId::generate();

        game.submit(GameCommand::AddPlayer {
            name: "Alice".to_string(),
            device_id: device.clone(),
        });
        game.submit(GameCommand::StartGame);

        assert_eq!(game.poll(), 2);
        assert_eq!(game.coordinator().round().phase, RoundPhase::InProgress);
    }

    #[test]
    fn test_submission_flows_through_queue() {
        let mut game = game_loop();
        let device = DeviceId::generate();

        game.submit(GameCommand::AddPlayer {
            name: "Alice".to_string(),
            device_id: device.clone(),
        });
        game.submit(GameCommand::StartGame);
        game.poll();

        let alice = game.coordinator().roster()[0].id;
        game.submit(GameCommand::SubmitTurn {
            submission: TurnSubmission::new(alice, device, TurnOutcome::banked(300)),
        });
        game.poll();

        assert_eq!(game.coordinator().player(&alice).unwrap().total_score, 300);
    }

    #[test]
    fn test_rejected_command_becomes_event() {
        let mut game = game_loop();

        game.submit(GameCommand::StartGame); // no players yet
        game.poll();

        let events = game.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CommandRejected { .. })));
    }

    #[test]
    fn test_coordinator_events_are_forwarded() {
        let mut game = game_loop();

        game.submit(GameCommand::AddPlayer {
            name: "Alice".to_string(),
            device_id: DeviceId::generate(),
        });
        game.submit(GameCommand::StartGame);
        game.poll();

        let events = game.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Coordinator(CoordinatorEvent::RoundStarted { number: 1 })
        )));
    }
}
