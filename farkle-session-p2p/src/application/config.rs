use crate::application::ReconnectPolicy;
use instant::Duration;

/// Tuning knobs for one session's replication and recovery behavior
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often the runtime driver pumps the session loop
    pub poll_interval_ms: u64,

    /// Minimum spacing between steady-state snapshot broadcasts; urgent
    /// changes (phase transitions, config changes) bypass it
    pub snapshot_throttle: Duration,

    /// Time without a snapshot before a client requests a full sync
    pub resync_timeout: Duration,

    /// How long the pending-resync UI flag survives without an answer
    pub resync_pending_timeout: Duration,

    /// How long a dropped peer may reconnect before its players are skipped
    pub grace_period: Duration,

    /// Spacing of best-effort health pings
    pub ping_interval: Duration,

    pub reconnect: ReconnectPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            snapshot_throttle: Duration::from_millis(250),
            resync_timeout: Duration::from_secs(10),
            resync_pending_timeout: Duration::from_secs(5),
            grace_period: Duration::from_secs(15),
            ping_interval: Duration::from_secs(2),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Configuration for deterministic tests: snapshots and grace periods
    /// collapse to zero, while the periodic timers (resync watchdog, pings)
    /// are pushed out so tests drive them explicitly.
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 1,
            snapshot_throttle: Duration::from_millis(0),
            resync_timeout: Duration::from_secs(3600),
            resync_pending_timeout: Duration::from_secs(3600),
            grace_period: Duration::from_millis(0),
            ping_interval: Duration::from_secs(3600),
            reconnect: ReconnectPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(0),
            },
        }
    }

    pub fn with_snapshot_throttle(mut self, throttle: Duration) -> Self {
        self.snapshot_throttle = throttle;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}
