use crate::domain::PeerId;
use instant::{Duration, Instant};

/// Bounded reconnection after an unexpected disconnect
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    /// First attempt waits this long; attempt n waits n times as long
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// State machine for one reconnection sequence
///
/// Delays grow linearly with the attempt number; exceeding the cap drops
/// the attempt silently and the user must re-initiate the join.
#[derive(Debug)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    target: Option<PeerId>,
    attempts_made: u32,
    next_attempt_at: Option<Instant>,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            target: None,
            attempts_made: 0,
            next_attempt_at: None,
        }
    }

    /// Begin reconnecting to a peer; schedules the first attempt
    pub fn begin(&mut self, target: PeerId) {
        self.target = Some(target);
        self.attempts_made = 0;
        self.schedule_next();
    }

    /// True while a reconnection sequence is running
    pub fn is_active(&self) -> bool {
        self.next_attempt_at.is_some()
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// If an attempt is due, consume it and return the target to dial
    pub fn poll_due(&mut self) -> Option<(PeerId, u32)> {
        let due_at = self.next_attempt_at?;
        if Instant::now() < due_at {
            return None;
        }

        let target = self.target?;
        self.attempts_made += 1;
        self.next_attempt_at = None;
        Some((target, self.attempts_made))
    }

    /// The in-flight attempt failed; schedule another or give up
    pub fn note_failure(&mut self) {
        if self.attempts_made >= self.policy.max_attempts {
            tracing::info!(
                "🔁 Giving up reconnection after {} attempts",
                self.attempts_made
            );
            self.reset();
            return;
        }
        self.schedule_next();
    }

    /// Connection is back; stop the sequence
    pub fn note_connected(&mut self) {
        self.reset();
    }

    fn schedule_next(&mut self) {
        // Attempt n waits base_delay * n (linear backoff)
        let n = self.attempts_made + 1;
        let delay = self.policy.base_delay * n;
        self.next_attempt_at = Some(Instant::now() + delay);
        tracing::debug!("🔁 Reconnect attempt {} scheduled in {:?}", n, delay);
    }

    fn reset(&mut self) {
        self.target = None;
        self.attempts_made = 0;
        self.next_attempt_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            base_delay: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_begin_schedules_first_attempt() {
        let mut state = ReconnectState::new(instant_policy(3));
        let target = PeerId::random();

        state.begin(target);
        assert!(state.is_active());

        let (dialed, attempt) = state.poll_due().unwrap();
        assert_eq!(dialed, target);
        assert_eq!(attempt, 1);
    }

    #[test]
    fn test_attempt_not_due_before_delay() {
        let mut state = ReconnectState::new(ReconnectPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(3600),
        });

        state.begin(PeerId::random());
        assert!(state.poll_due().is_none());
        assert!(state.is_active());
    }

    #[test]
    fn test_cap_gives_up_silently() {
        let mut state = ReconnectState::new(instant_policy(2));
        state.begin(PeerId::random());

        // Attempt 1 fails, attempt 2 fails → exhausted
        assert!(state.poll_due().is_some());
        state.note_failure();
        assert!(state.poll_due().is_some());
        state.note_failure();

        assert!(!state.is_active());
        assert!(state.poll_due().is_none());
    }

    #[test]
    fn test_success_resets_sequence() {
        let mut state = ReconnectState::new(instant_policy(5));
        state.begin(PeerId::random());

        assert!(state.poll_due().is_some());
        state.note_connected();

        assert!(!state.is_active());
        assert_eq!(state.attempts_made(), 0);
    }

    #[test]
    fn test_delay_grows_linearly() {
        let base = Duration::from_millis(100);
        let policy = ReconnectPolicy {
            max_attempts: 3,
            base_delay: base,
        };

        // Attempt n waits base * n
        assert_eq!(policy.base_delay * 1, base);
        assert_eq!(policy.base_delay * 3, Duration::from_millis(300));
    }
}
