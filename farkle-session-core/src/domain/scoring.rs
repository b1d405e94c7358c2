use crate::domain::TurnOutcome;

/// The dice-scoring rule evaluator, an external collaborator
///
/// The rule table itself lives outside this crate; the coordinator only
/// consults it while validating a submitted turn.
pub trait ScoreEvaluator {
    /// Maximum score attainable from one roll's die faces
    fn score_roll(&self, dice: &[u8]) -> u32;

    /// Check that a claimed outcome is attainable from its roll history.
    ///
    /// An outcome without roll history cannot be checked and is accepted;
    /// transports that include the history get full validation.
    fn validate_outcome(&self, outcome: &TurnOutcome) -> bool {
        if outcome.is_farkle {
            return outcome.score_earned == 0;
        }
        if outcome.roll_history.is_empty() {
            return true;
        }

        let attainable: u32 = outcome
            .roll_history
            .iter()
            .map(|roll| self.score_roll(roll))
            .sum();
        outcome.score_earned <= attainable
    }
}

/// Evaluator that accepts every claimed score
///
/// Stands in for the real rule table in tests and demos.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustingEvaluator;

impl ScoreEvaluator for TrustingEvaluator {
    fn score_roll(&self, _dice: &[u8]) -> u32 {
        0
    }

    fn validate_outcome(&self, outcome: &TurnOutcome) -> bool {
        !outcome.is_farkle || outcome.score_earned == 0
    }
}
