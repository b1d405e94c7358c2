pub mod application;
pub mod domain;

pub use application::{GameCommand, GameEvent, GameLoop};
pub use domain::{
    AdvanceReason, CoordinatorError, CoordinatorEvent, DeviceId, GameConfig, IdentityError,
    IdentityManager, IdentityStore, InMemoryIdentityStore, PlayerRecord, RoundCoordinator,
    RoundPhase, RoundState, ScoreEvaluator, SubmittedResult, Timestamp, TrustingEvaluator,
    TurnOutcome, TurnProgress, TurnStatus, TurnSubmission,
};
