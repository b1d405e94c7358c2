use crate::domain::CoordinatorEvent;

/// Events surfaced by the game loop to its embedder
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The coordinator mutated state
    Coordinator(CoordinatorEvent),

    /// A command was dropped during validation (spoofed submission,
    /// terminal status, unknown player, ...)
    CommandRejected { reason: String },
}

impl From<CoordinatorEvent> for GameEvent {
    fn from(event: CoordinatorEvent) -> Self {
        GameEvent::Coordinator(event)
    }
}
