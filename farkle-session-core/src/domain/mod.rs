mod config;
mod coordinator;
mod identity;
mod player;
mod round;
mod scoring;
mod time;
mod turn;

pub use config::GameConfig;
pub use coordinator::{AdvanceReason, CoordinatorError, CoordinatorEvent, RoundCoordinator};
pub use identity::{DeviceId, IdentityError, IdentityManager, IdentityStore, InMemoryIdentityStore};
pub use player::{PlayerRecord, TurnStatus};
pub use round::{RoundPhase, RoundState};
pub use scoring::{ScoreEvaluator, TrustingEvaluator};
pub use time::Timestamp;
pub use turn::{SubmittedResult, TurnOutcome, TurnProgress, TurnSubmission};
