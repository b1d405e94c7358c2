use farkle_session_core::{DeviceId, GameConfig, PlayerRecord, RoundState, TurnProgress, TurnStatus};
use instant::{Duration, Instant};
use std::collections::HashMap;
use uuid::Uuid;

/// Coalesces snapshot broadcasts to at most one per interval
///
/// Every coordinator mutation marks the broadcaster dirty; steady-state
/// changes wait out the throttle window while urgent ones (phase
/// transitions, final-round trigger, config changes) go out on the next
/// poll regardless.
#[derive(Debug)]
pub struct SnapshotBroadcaster {
    min_interval: Duration,
    last_sent: Option<Instant>,
    dirty: bool,
    urgent: bool,
}

impl SnapshotBroadcaster {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
            dirty: false,
            urgent: false,
        }
    }

    pub fn mark_dirty(&mut self, urgent: bool) {
        self.dirty = true;
        self.urgent = self.urgent || urgent;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True when a snapshot should be sent now; consumes the dirty flag
    pub fn poll_due(&mut self) -> bool {
        if !self.dirty {
            return false;
        }

        let throttled = match self.last_sent {
            Some(sent) if !self.urgent => sent.elapsed() < self.min_interval,
            _ => false,
        };
        if throttled {
            return false;
        }

        self.dirty = false;
        self.urgent = false;
        self.last_sent = Some(Instant::now());
        true
    }
}

/// Source of a mirrored turn status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// Replicated from a host snapshot
    Authoritative,
    /// Set locally, awaiting host confirmation
    Optimistic,
}

/// A turn status together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirroredStatus {
    pub status: TurnStatus,
    pub source: StatusSource,
}

/// Client-side read-only replica of the host's session state
///
/// Updated atomically: a Welcome replaces everything, a snapshot replaces
/// the whole round state. Optimistic local statuses are an overlay that the
/// next snapshot reconciles away — the snapshot always wins, nothing is
/// merged.
#[derive(Debug, Default)]
pub struct ClientMirror {
    host_device_id: Option<DeviceId>,
    config: Option<GameConfig>,
    players: HashMap<Uuid, PlayerRecord>,
    turn_order: Vec<Uuid>,
    assignments: HashMap<Uuid, DeviceId>,
    round: Option<RoundState>,
    optimistic: HashMap<Uuid, TurnStatus>,
    spectate: HashMap<Uuid, TurnProgress>,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a Welcome has been adopted
    pub fn is_adopted(&self) -> bool {
        self.host_device_id.is_some()
    }

    pub fn host_device_id(&self) -> Option<&DeviceId> {
        self.host_device_id.as_ref()
    }

    pub fn config(&self) -> Option<&GameConfig> {
        self.config.as_ref()
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn player(&self, player_id: &Uuid) -> Option<&PlayerRecord> {
        self.players.get(player_id)
    }

    /// Players in roster order
    pub fn roster(&self) -> Vec<&PlayerRecord> {
        self.turn_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .collect()
    }

    pub fn assignments(&self) -> &HashMap<Uuid, DeviceId> {
        &self.assignments
    }

    /// Players assigned to the given device
    pub fn players_for_device(&self, device_id: &DeviceId) -> Vec<Uuid> {
        self.turn_order
            .iter()
            .filter(|id| self.assignments.get(id) == Some(device_id))
            .copied()
            .collect()
    }

    pub fn spectate_progress(&self, player_id: &Uuid) -> Option<&TurnProgress> {
        self.spectate.get(player_id)
    }

    /// Current status of a player, optimistic overlay first
    pub fn status(&self, player_id: &Uuid) -> Option<MirroredStatus> {
        if let Some(status) = self.optimistic.get(player_id) {
            return Some(MirroredStatus {
                status: *status,
                source: StatusSource::Optimistic,
            });
        }
        self.round
            .as_ref()
            .and_then(|round| round.status(player_id))
            .map(|status| MirroredStatus {
                status,
                source: StatusSource::Authoritative,
            })
    }

    /// Set a local, host-unconfirmed status (e.g. `Submitted` right after
    /// sending a submission)
    pub fn mark_optimistic(&mut self, player_id: Uuid, status: TurnStatus) {
        self.optimistic.insert(player_id, status);
    }

    /// Record a relayed spectator snapshot
    pub fn note_spectate(&mut self, player_id: Uuid, progress: TurnProgress) {
        self.spectate.insert(player_id, progress);
    }

    /// Adopt a Welcome wholesale, overwriting all local state
    pub fn apply_welcome(
        &mut self,
        host_device_id: DeviceId,
        config: GameConfig,
        roster: Vec<PlayerRecord>,
        assignments: HashMap<Uuid, DeviceId>,
        round_state: RoundState,
    ) {
        self.host_device_id = Some(host_device_id);
        self.config = Some(config);
        self.turn_order = roster.iter().map(|p| p.id).collect();
        self.players = roster.into_iter().map(|p| (p.id, p)).collect();
        self.assignments = assignments;
        self.round = Some(round_state);
        self.optimistic.clear();
        self.spectate.clear();
    }

    /// Apply a full round-state snapshot
    ///
    /// Idempotent: replaying the same snapshot yields identical state.
    /// Returns false when the snapshot was ignored (no session adopted yet,
    /// or older than what we already have).
    pub fn apply_snapshot(&mut self, state: RoundState) -> bool {
        if !self.is_adopted() {
            tracing::debug!("📥 Ignoring snapshot: no session adopted");
            return false;
        }
        if let Some(current) = &self.round {
            let stale = state.round_number < current.round_number
                || (state.round_number == current.round_number
                    && state.timestamp < current.timestamp);
            if stale {
                tracing::debug!(
                    "📥 Ignoring stale snapshot (round {} @ {})",
                    state.round_number,
                    state.timestamp
                );
                return false;
            }
        }

        // Fold recorded results into the player mirrors; results carry the
        // resulting totals, so reapplying them assigns the same values.
        for result in &state.submitted_results {
            if let Some(player) = self.players.get_mut(&result.player_id) {
                player.total_score = result.new_total;
                player.round_score = result.round_score;
                player.is_eligible = result.eligible_after;
                player.consecutive_farkles = result.farkle_streak_after;
            }
        }

        // Spectate snapshots are only meaningful for live turns
        self.spectate.retain(|player_id, _| {
            state
                .status(player_id)
                .map(|status| !status.is_terminal())
                .unwrap_or(false)
        });

        self.round = Some(state);
        // Snapshot always wins over optimistic local state
        self.optimistic.clear();
        true
    }

    /// Forget the session entirely (leave / new session)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Tracks snapshot freshness and drives resync-on-demand
///
/// The pending flag is purely a UI signal: it never blocks gameplay, and a
/// timeout clears it even if no reply ever comes.
#[derive(Debug)]
pub struct ResyncTracker {
    timeout: Duration,
    pending_timeout: Duration,
    last_snapshot: Option<Instant>,
    pending_since: Option<Instant>,
}

impl ResyncTracker {
    pub fn new(timeout: Duration, pending_timeout: Duration) -> Self {
        Self {
            timeout,
            pending_timeout,
            last_snapshot: None,
            pending_since: None,
        }
    }

    /// A snapshot (or Welcome) arrived. Returns true when this cleared a
    /// pending resync.
    pub fn note_snapshot(&mut self) -> bool {
        self.last_snapshot = Some(Instant::now());
        self.pending_since.take().is_some()
    }

    /// True when the snapshot gap exceeded the timeout and no request is
    /// already in flight
    pub fn should_request(&self) -> bool {
        if self.pending_since.is_some() {
            return false;
        }
        match self.last_snapshot {
            Some(last) => last.elapsed() >= self.timeout,
            None => false,
        }
    }

    /// Foreground return always warrants a fresh sync (if we have a session
    /// and none is in flight)
    pub fn should_request_on_foreground(&self) -> bool {
        self.last_snapshot.is_some() && self.pending_since.is_none()
    }

    pub fn mark_requested(&mut self) {
        self.pending_since = Some(Instant::now());
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Expire a pending flag that never got an answer. Returns true when
    /// the flag was cleared by this call.
    pub fn tick(&mut self) -> bool {
        match self.pending_since {
            Some(since) if since.elapsed() >= self.pending_timeout => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}
