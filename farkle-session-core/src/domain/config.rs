use serde::{Deserialize, Serialize};

/// Rule configuration for one game session
///
/// Owned by the host and replicated wholesale in the Welcome; clients never
/// edit it locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Total score that triggers the final round
    pub winning_score: u32,

    /// Minimum single-turn score required before a player may bank points.
    /// `None` disables the opening rule entirely.
    pub opening_threshold: Option<u32>,

    /// Penalty deducted after three consecutive farkles (floored at zero).
    /// `None` disables the rule.
    pub triple_farkle_penalty: Option<u32>,

    /// Simultaneous-turn rounds (default). When off, the legacy single-shot
    /// action messages drive turns one player at a time.
    pub simultaneous_turns: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            winning_score: 10_000,
            opening_threshold: Some(500),
            triple_farkle_penalty: Some(1_000),
            simultaneous_turns: true,
        }
    }
}

impl GameConfig {
    pub fn with_winning_score(mut self, score: u32) -> Self {
        self.winning_score = score;
        self
    }

    pub fn without_opening_threshold(mut self) -> Self {
        self.opening_threshold = None;
        self
    }

    pub fn without_triple_farkle_penalty(mut self) -> Self {
        self.triple_farkle_penalty = None;
        self
    }
}
