use crate::application::{
    ClientMirror, MirroredStatus, ReconnectState, ResyncTracker, SessionConfig, SessionEvent,
    SnapshotBroadcaster,
};
use crate::domain::{PeerDeviceMap, PeerId, PeerRegistry, SessionCode, SessionMetadata};
use crate::error::{P2PError, Result};
use crate::infrastructure::{Transport, TransportEvent};
use crate::protocol::{validate_greeting, HandshakePhase, WireMessage, PROTOCOL_VERSION};
use farkle_session_core::{
    AdvanceReason, CoordinatorEvent, DeviceId, GameCommand, GameConfig, GameEvent, GameLoop,
    RoundPhase, ScoreEvaluator, TurnOutcome, TurnProgress, TurnStatus, TurnSubmission,
};
use instant::{Duration, Instant};
use std::collections::HashSet;
use uuid::Uuid;

/// Commands a UI feeds the host loop through the runtime channel
#[derive(Debug, Clone)]
pub enum HostCommand {
    AddPlayer { name: String, device_id: DeviceId },
    AddLocalPlayer { name: String },
    StartGame,
    StartNewRound,
    ForceAdvance { reason: AdvanceReason },
    SubmitLocalTurn { player_id: Uuid, outcome: TurnOutcome },
    NoteLocalProgress { player_id: Uuid, progress: TurnProgress },
}

/// Commands a UI feeds the client loop through the runtime channel
#[derive(Debug, Clone)]
pub enum ClientCommand {
    Browse,
    Join { peer: PeerId },
    StartLocalTurn { player_id: Uuid },
    BroadcastProgress { player_id: Uuid, progress: TurnProgress },
    SubmitLocalTurn { player_id: Uuid, outcome: TurnOutcome },
    Foregrounded,
    RequestResync,
}

/// Host-side session loop: the single thread through which every inbound
/// event, submission and timer flows
///
/// Owns the authoritative `GameLoop`, the peer registry and the replication
/// broadcaster. Inbound transport events become queued messages processed
/// serially by `poll()`, so completion checks and final-round triggering
/// never race.
pub struct HostSessionLoop<T: Transport> {
    transport: T,
    device_id: DeviceId,
    display_name: String,
    session_code: SessionCode,
    config: SessionConfig,
    game: GameLoop,
    registry: PeerRegistry,
    device_map: PeerDeviceMap,
    broadcaster: SnapshotBroadcaster,
    last_ping: Option<Instant>,
    events: Vec<SessionEvent>,
}

impl<T: Transport> HostSessionLoop<T> {
    pub fn new(
        transport: T,
        device_id: DeviceId,
        display_name: String,
        game_config: GameConfig,
        evaluator: Box<dyn ScoreEvaluator + Send>,
        config: SessionConfig,
    ) -> Result<Self> {
        let session_code = SessionCode::generate();
        let mut host = Self {
            transport,
            device_id,
            display_name,
            session_code,
            registry: PeerRegistry::with_grace_period(config.grace_period),
            device_map: PeerDeviceMap::new(),
            broadcaster: SnapshotBroadcaster::new(config.snapshot_throttle),
            config,
            game: GameLoop::new(game_config, evaluator),
            last_ping: None,
            events: Vec::new(),
        };

        host.update_advertising()?;
        tracing::info!("📣 Hosting session {}", host.session_code);
        Ok(host)
    }

    // ===== Getters =====

    pub fn session_code(&self) -> &SessionCode {
        &self.session_code
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn local_peer_id(&self) -> PeerId {
        self.transport.local_peer_id()
    }

    /// Read-only view of the authoritative state
    pub fn game(&self) -> &GameLoop {
        &self.game
    }

    pub fn connected_device_count(&self) -> usize {
        self.registry.established_peers().len()
    }

    /// Drain UI observer events
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Host-local actions =====

    /// Queue a raw game command (processed on the next poll)
    pub fn submit_command(&mut self, command: GameCommand) {
        self.game.submit(command);
    }

    /// Add a player controlled by this device
    pub fn add_local_player(&mut self, name: String) {
        self.game.submit(GameCommand::AddPlayer {
            name,
            device_id: self.device_id.clone(),
        });
    }

    pub fn start_game(&mut self) {
        self.game.submit(GameCommand::StartGame);
    }

    pub fn force_advance(&mut self, reason: AdvanceReason) {
        self.game.submit(GameCommand::ForceAdvance { reason });
    }

    /// Submit a turn for a player controlled by this device; applied
    /// directly, no network hop
    pub fn submit_local_turn(&mut self, player_id: Uuid, outcome: TurnOutcome) {
        let submission = TurnSubmission::new(player_id, self.device_id.clone(), outcome);
        self.game.submit(GameCommand::SubmitTurn { submission });
    }

    /// Record and relay live progress for a locally controlled player
    pub fn note_local_progress(&mut self, player_id: Uuid, progress: TurnProgress) {
        self.relay_progress(None, player_id, self.device_id.clone(), progress.clone());
        self.game.submit(GameCommand::NoteTurnProgress {
            player_id,
            device_id: self.device_id.clone(),
            progress,
        });
    }

    /// Apply a runtime command
    pub fn apply_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::AddPlayer { name, device_id } => {
                self.game.submit(GameCommand::AddPlayer { name, device_id })
            }
            HostCommand::AddLocalPlayer { name } => self.add_local_player(name),
            HostCommand::StartGame => self.start_game(),
            HostCommand::StartNewRound => self.game.submit(GameCommand::StartNewRound),
            HostCommand::ForceAdvance { reason } => self.force_advance(reason),
            HostCommand::SubmitLocalTurn { player_id, outcome } => {
                self.submit_local_turn(player_id, outcome)
            }
            HostCommand::NoteLocalProgress {
                player_id,
                progress,
            } => self.note_local_progress(player_id, progress),
        }
    }

    // ===== Main loop =====

    /// Process everything pending; returns how many events were handled
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;

        for event in self.transport.poll_events() {
            processed += 1;
            match event {
                TransportEvent::PeerConnected(peer_id) => {
                    tracing::info!("🟢 HOST: peer {} connected, awaiting greeting", peer_id);
                    self.registry.add_peer(peer_id);
                }
                TransportEvent::PeerDisconnected(peer_id) => {
                    tracing::info!("🔴 HOST: peer {} disconnected", peer_id);
                    self.registry.mark_peer_disconnected(&peer_id);
                }
                TransportEvent::MessageReceived { from, data } => {
                    match WireMessage::decode(&data) {
                        Ok(message) => self.handle_message(from, message),
                        Err(e) => {
                            tracing::debug!("Dropping undecodable message from {}: {}", from, e)
                        }
                    }
                }
                // Hosts do not browse
                TransportEvent::SessionDiscovered(_) => {}
            }
        }

        self.sweep_grace_periods();
        processed += self.game.poll();
        self.pump_game_events();
        self.flush_snapshot();
        self.send_pings();

        processed
    }

    // ===== Inbound messages =====

    fn handle_message(&mut self, from: PeerId, message: WireMessage) {
        self.registry.update_last_seen(&from);

        let message = match message {
            WireMessage::Greeting {
                device_id,
                display_name,
                protocol_version,
                session_code,
            } => {
                self.handle_greeting(from, device_id, display_name, protocol_version, session_code);
                return;
            }
            other => other,
        };

        // Everything except a Greeting requires a completed handshake
        if !self.registry.is_established(&from) {
            tracing::debug!("🚫 Dropping message from unestablished peer {}", from);
            return;
        }

        match message {
            WireMessage::RequestFullSync => {
                tracing::info!("🔄 Peer {} requested full sync", from);
                if let Err(e) = self.send_welcome_to(from) {
                    tracing::warn!("❌ Failed to answer full sync: {}", e);
                }
            }
            WireMessage::TurnSubmission { submission } => {
                // The submitting device must be the one behind this connection
                if self.device_map.device_for(&from) != Some(&submission.submitting_device_id) {
                    tracing::warn!(
                        "⚠️  Submission for player {} arrived over the wrong connection, dropped",
                        submission.player_id
                    );
                    return;
                }
                self.game.submit(GameCommand::SubmitTurn { submission });
            }
            WireMessage::TurnProgress {
                player_id,
                device_id,
                progress,
            } => {
                if self.device_map.device_for(&from) != Some(&device_id) {
                    tracing::warn!("⚠️  Progress for player {} over wrong connection", player_id);
                    return;
                }
                self.relay_progress(Some(from), player_id, device_id.clone(), progress.clone());
                self.game.submit(GameCommand::NoteTurnProgress {
                    player_id,
                    device_id,
                    progress,
                });
            }
            WireMessage::Ping => {
                let _ = self.send_to(from, &WireMessage::Pong);
            }
            WireMessage::Pong => {}
            WireMessage::Roll { player_id, dice }
            | WireMessage::SelectDice { player_id, dice } => {
                self.handle_legacy_progress(from, player_id, dice)
            }
            WireMessage::BankTurn { player_id, score } => {
                self.handle_legacy_bank(from, player_id, score)
            }
            WireMessage::SkipTurn { player_id } => self.handle_legacy_skip(from, player_id),
            // Host-originated messages have no business arriving here
            other => {
                tracing::debug!(
                    "🚫 Ignoring host-only message from peer {}: {:?}",
                    from,
                    std::mem::discriminant(&other)
                );
            }
        }
    }

    fn handle_greeting(
        &mut self,
        from: PeerId,
        device_id: DeviceId,
        display_name: String,
        protocol_version: u16,
        session_code: SessionCode,
    ) {
        if let Err(e) = validate_greeting(&self.session_code, &session_code, protocol_version) {
            // Not registered; the stalled connection is the rejection signal
            tracing::info!("🚷 Ignoring greeting from {}: {}", from, e);
            return;
        }

        tracing::info!("🤝 Peer {} greeted as device {} ({})", from, device_id, display_name);

        // A device reconnecting under a new handle evicts its stale mapping
        self.device_map.register(from, device_id.clone());
        if self.registry.get_peer(&from).is_none() {
            self.registry.add_peer(from);
        }
        if let Some(peer) = self.registry.get_peer_mut(&from) {
            peer.mark_established(device_id.clone(), display_name.clone());
        }

        if let Err(e) = self.send_welcome_to(from) {
            tracing::warn!("❌ Failed to send welcome: {}", e);
        }
        let _ = self.update_advertising();
        self.events.push(SessionEvent::PeerJoined {
            device_id,
            display_name,
        });
    }

    // ===== Legacy single-shot fallback =====

    fn legacy_allowed(&self, from: &PeerId, player_id: &Uuid) -> bool {
        if self.game.coordinator().config().simultaneous_turns {
            tracing::debug!("🚫 Legacy action in simultaneous mode, dropped");
            return false;
        }
        let mapped = self.device_map.device_for(from);
        let assigned = self.game.coordinator().assigned_device(player_id);
        if mapped.is_none() || mapped != assigned {
            tracing::warn!("⚠️  Legacy action for player {} over wrong connection", player_id);
            return false;
        }
        true
    }

    fn handle_legacy_progress(&mut self, from: PeerId, player_id: Uuid, dice: Vec<u8>) {
        if !self.legacy_allowed(&from, &player_id) {
            return;
        }
        let device_id = self
            .device_map
            .device_for(&from)
            .expect("checked by legacy_allowed")
            .clone();
        let remaining = dice.len() as u8;
        let progress = TurnProgress {
            current_roll: dice,
            selected_dice: Vec::new(),
            running_score: 0,
            roll_count: 0,
            remaining_dice: remaining,
        };
        self.relay_progress(Some(from), player_id, device_id.clone(), progress.clone());
        self.game.submit(GameCommand::NoteTurnProgress {
            player_id,
            device_id,
            progress,
        });
    }

    fn handle_legacy_bank(&mut self, from: PeerId, player_id: Uuid, score: u32) {
        if !self.legacy_allowed(&from, &player_id) {
            return;
        }
        let device_id = self
            .device_map
            .device_for(&from)
            .expect("checked by legacy_allowed")
            .clone();
        let submission = TurnSubmission::new(player_id, device_id, TurnOutcome::banked(score));
        self.game.submit(GameCommand::SubmitTurn { submission });
    }

    fn handle_legacy_skip(&mut self, from: PeerId, player_id: Uuid) {
        if !self.legacy_allowed(&from, &player_id) {
            return;
        }
        self.game.submit(GameCommand::SkipPlayer { player_id });
    }

    // ===== Timers and sweeps =====

    /// Skip players of devices whose grace period ran out
    fn sweep_grace_periods(&mut self) {
        for peer_id in self.registry.check_grace_periods() {
            if let Some(device_id) = self.device_map.remove_by_peer(&peer_id) {
                tracing::info!(
                    "⏳ Device {} grace period expired, skipping its players",
                    device_id
                );
                self.game.submit(GameCommand::DeviceDisconnected {
                    device_id: device_id.clone(),
                });
                self.events.push(SessionEvent::PeerLeft { device_id });
                let _ = self.update_advertising();
            }
            self.registry.remove_peer(&peer_id);
        }
    }

    /// Translate coordinator events into broadcasts and observer events
    fn pump_game_events(&mut self) {
        for event in self.game.drain_events() {
            match event {
                GameEvent::Coordinator(event) => match event {
                    CoordinatorEvent::StateChanged { urgent } => {
                        self.broadcaster.mark_dirty(urgent);
                        self.events.push(SessionEvent::StateUpdated);
                    }
                    CoordinatorEvent::RoundStarted { number } => {
                        let _ = self.broadcast(&WireMessage::RoundStarted { number });
                        self.events.push(SessionEvent::RoundStarted { number });
                    }
                    CoordinatorEvent::RoundForced { reason } => {
                        let _ = self.broadcast(&WireMessage::ForceAdvance { reason });
                        self.events.push(SessionEvent::RoundForced { reason });
                    }
                    CoordinatorEvent::RosterChanged => {
                        self.broadcast_welcome();
                        let _ = self.update_advertising();
                        self.events.push(SessionEvent::StateUpdated);
                    }
                    CoordinatorEvent::GameOver { winner } => {
                        self.events.push(SessionEvent::GameOver { winner });
                    }
                },
                GameEvent::CommandRejected { reason } => {
                    self.events.push(SessionEvent::ActionRejected { reason });
                }
            }
        }
    }

    /// Send the throttled snapshot if one is due
    fn flush_snapshot(&mut self) {
        if self.broadcaster.poll_due() {
            let state = self.game.coordinator().round().clone();
            let _ = self.broadcast(&WireMessage::RoundStateSnapshot { state });
        }
    }

    fn send_pings(&mut self) {
        let due = self
            .last_ping
            .map(|at| at.elapsed() >= self.config.ping_interval)
            .unwrap_or(true);
        if due && !self.registry.established_peers().is_empty() {
            let _ = self.broadcast(&WireMessage::Ping);
            self.last_ping = Some(Instant::now());
        }
    }

    // ===== Outbound =====

    fn send_to(&mut self, peer: PeerId, message: &WireMessage) -> Result<()> {
        let data = message.encode()?;
        self.transport.send_to(peer, data, message.delivery_mode())
    }

    /// Send to every established peer; failures are logged, never retried
    /// (the next snapshot self-heals divergence)
    fn broadcast(&mut self, message: &WireMessage) -> Result<()> {
        let data = message.encode()?;
        let mode = message.delivery_mode();
        for peer in self.registry.established_peers() {
            if let Err(e) = self.transport.send_to(peer, data.clone(), mode) {
                tracing::warn!("❌ Send to {} failed: {}", peer, e);
            }
        }
        Ok(())
    }

    fn welcome_message(&self) -> WireMessage {
        let coordinator = self.game.coordinator();
        WireMessage::Welcome {
            host_device_id: self.device_id.clone(),
            config: coordinator.config().clone(),
            roster: coordinator.roster().into_iter().cloned().collect(),
            assignments: coordinator.assignments().clone(),
            round_state: coordinator.round().clone(),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    fn send_welcome_to(&mut self, peer: PeerId) -> Result<()> {
        let welcome = self.welcome_message();
        self.send_to(peer, &welcome)
    }

    fn broadcast_welcome(&mut self) {
        let welcome = self.welcome_message();
        let _ = self.broadcast(&welcome);
    }

    /// Relay a spectate snapshot to every established peer except its origin
    fn relay_progress(
        &mut self,
        origin: Option<PeerId>,
        player_id: Uuid,
        device_id: DeviceId,
        progress: TurnProgress,
    ) {
        let message = WireMessage::TurnProgress {
            player_id,
            device_id,
            progress,
        };
        let data = match message.encode() {
            Ok(data) => data,
            Err(_) => return,
        };
        let mode = message.delivery_mode();
        for peer in self.registry.established_peers() {
            if Some(peer) == origin {
                continue;
            }
            let _ = self.transport.send_to(peer, data.clone(), mode);
        }
    }

    fn update_advertising(&mut self) -> Result<()> {
        self.transport.start_advertising(SessionMetadata {
            session_code: self.session_code.clone(),
            host_device_id: self.device_id.clone(),
            display_name: self.display_name.clone(),
            protocol_version: PROTOCOL_VERSION,
            player_count: self.game.coordinator().players().len() as u32,
        })
    }
}

/// Client-side session loop: mirrors the host and originates local turns
pub struct ClientSessionLoop<T: Transport> {
    transport: T,
    device_id: DeviceId,
    display_name: String,
    session_code: SessionCode,
    mirror: ClientMirror,
    resync: ResyncTracker,
    reconnect: ReconnectState,
    host_peer: Option<PeerId>,
    phase: HandshakePhase,
    /// Players on this device with a turn currently in progress
    local_turns: HashSet<Uuid>,
    last_ping: Option<Instant>,
    ping_interval: Duration,
    events: Vec<SessionEvent>,
}

impl<T: Transport> ClientSessionLoop<T> {
    pub fn new(
        transport: T,
        device_id: DeviceId,
        display_name: String,
        session_code: SessionCode,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            device_id,
            display_name,
            session_code,
            mirror: ClientMirror::new(),
            resync: ResyncTracker::new(config.resync_timeout, config.resync_pending_timeout),
            reconnect: ReconnectState::new(config.reconnect.clone()),
            host_peer: None,
            phase: HandshakePhase::Connecting,
            local_turns: HashSet::new(),
            last_ping: None,
            ping_interval: config.ping_interval,
            events: Vec::new(),
        }
    }

    // ===== Getters =====

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn local_peer_id(&self) -> PeerId {
        self.transport.local_peer_id()
    }

    pub fn mirror(&self) -> &ClientMirror {
        &self.mirror
    }

    pub fn is_established(&self) -> bool {
        self.phase == HandshakePhase::Established
    }

    /// True while a resync request is unanswered (UI indicator only; it
    /// never blocks gameplay)
    pub fn is_resync_pending(&self) -> bool {
        self.resync.is_pending()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Join flow =====

    pub fn start_browsing(&mut self) -> Result<()> {
        self.transport.start_browsing()
    }

    /// Open a connection to a discovered host; the Greeting goes out once
    /// the raw connection comes up
    pub fn join(&mut self, host: PeerId) -> Result<()> {
        self.host_peer = Some(host);
        self.phase = HandshakePhase::Connecting;
        self.transport.connect(host)
    }

    // ===== Local turns =====

    /// Begin a local turn; refused unless the replicated status is Pending
    pub fn start_local_turn(&mut self, player_id: Uuid) -> Result<()> {
        if !self.is_established() {
            return Err(P2PError::NotConnectedToHost);
        }
        if !self
            .mirror
            .players_for_device(&self.device_id)
            .contains(&player_id)
        {
            return Err(P2PError::LocalTurnUnavailable(
                "player is not assigned to this device".to_string(),
            ));
        }
        match self.mirror.status(&player_id) {
            Some(MirroredStatus {
                status: TurnStatus::Pending,
                ..
            }) => {}
            other => {
                return Err(P2PError::LocalTurnUnavailable(format!(
                    "turn status is {:?}",
                    other.map(|s| s.status)
                )))
            }
        }

        self.local_turns.insert(player_id);
        self.mirror
            .mark_optimistic(player_id, TurnStatus::InProgress);
        Ok(())
    }

    /// Broadcast live progress for spectators (best-effort, via the host)
    pub fn broadcast_progress(&mut self, player_id: Uuid, progress: TurnProgress) -> Result<()> {
        if !self.local_turns.contains(&player_id) {
            return Err(P2PError::LocalTurnUnavailable(
                "no local turn in progress".to_string(),
            ));
        }
        self.send_to_host(&WireMessage::TurnProgress {
            player_id,
            device_id: self.device_id.clone(),
            progress,
        })
    }

    /// Package and send the finished turn; the local status flips to
    /// Submitted optimistically until the next snapshot confirms it
    pub fn submit_local_turn(&mut self, player_id: Uuid, outcome: TurnOutcome) -> Result<()> {
        if !self.is_established() {
            return Err(P2PError::NotConnectedToHost);
        }
        match self.mirror.status(&player_id) {
            Some(MirroredStatus { status, .. }) if !status.is_terminal() => {}
            other => {
                return Err(P2PError::LocalTurnUnavailable(format!(
                    "turn status is {:?}",
                    other.map(|s| s.status)
                )))
            }
        }

        let submission = TurnSubmission::new(player_id, self.device_id.clone(), outcome);
        self.send_to_host(&WireMessage::TurnSubmission { submission })?;
        self.mirror.mark_optimistic(player_id, TurnStatus::Submitted);
        self.local_turns.remove(&player_id);
        Ok(())
    }

    // ===== Recovery =====

    /// The app returned to the foreground; the mirror may be stale
    pub fn notify_foregrounded(&mut self) {
        if self.is_established() && self.resync.should_request_on_foreground() {
            self.request_full_sync();
        }
    }

    fn request_full_sync(&mut self) {
        if self.send_to_host(&WireMessage::RequestFullSync).is_ok() {
            self.resync.mark_requested();
            self.events.push(SessionEvent::ResyncPending(true));
            tracing::info!("🔄 Requested full sync from host");
        }
    }

    /// Apply a runtime command
    pub fn apply_command(&mut self, command: ClientCommand) {
        let result = match command {
            ClientCommand::Browse => self.start_browsing(),
            ClientCommand::Join { peer } => self.join(peer),
            ClientCommand::StartLocalTurn { player_id } => self.start_local_turn(player_id),
            ClientCommand::BroadcastProgress {
                player_id,
                progress,
            } => self.broadcast_progress(player_id, progress),
            ClientCommand::SubmitLocalTurn { player_id, outcome } => {
                self.submit_local_turn(player_id, outcome)
            }
            ClientCommand::Foregrounded => {
                self.notify_foregrounded();
                Ok(())
            }
            ClientCommand::RequestResync => {
                self.request_full_sync();
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::warn!("❌ Client command failed: {}", e);
            self.events.push(SessionEvent::ActionRejected {
                reason: e.to_string(),
            });
        }
    }

    // ===== Main loop =====

    pub fn poll(&mut self) -> usize {
        let mut processed = 0;

        for event in self.transport.poll_events() {
            processed += 1;
            match event {
                TransportEvent::SessionDiscovered(session) => {
                    self.events.push(SessionEvent::SessionDiscovered(session));
                }
                TransportEvent::PeerConnected(peer) => {
                    if Some(peer) == self.host_peer {
                        self.reconnect.note_connected();
                        self.phase = HandshakePhase::AwaitingGreeting;
                        self.send_greeting();
                    }
                }
                TransportEvent::PeerDisconnected(peer) => {
                    if Some(peer) == self.host_peer {
                        tracing::info!("🔌 Lost connection to host, reconnecting");
                        self.phase = HandshakePhase::Connecting;
                        self.reconnect.begin(peer);
                    }
                }
                TransportEvent::MessageReceived { from, data } => {
                    if Some(from) != self.host_peer {
                        tracing::debug!("🚫 Dropping message from non-host peer {}", from);
                        continue;
                    }
                    match WireMessage::decode(&data) {
                        Ok(message) => self.handle_message(message),
                        Err(e) => tracing::debug!("Dropping undecodable message: {}", e),
                    }
                }
            }
        }

        if self.is_established() {
            if self.resync.should_request() {
                self.request_full_sync();
            }
            if self.resync.tick() {
                self.events.push(SessionEvent::ResyncPending(false));
            }
        }

        if let Some((target, attempt)) = self.reconnect.poll_due() {
            tracing::info!("🔁 Reconnect attempt {} to host", attempt);
            if self.transport.connect(target).is_err() {
                self.reconnect.note_failure();
            }
        }

        self.send_ping_if_due();
        processed
    }

    fn send_greeting(&mut self) {
        tracing::info!("🤝 Greeting host for session {}", self.session_code);
        let greeting = WireMessage::Greeting {
            device_id: self.device_id.clone(),
            display_name: self.display_name.clone(),
            protocol_version: PROTOCOL_VERSION,
            session_code: self.session_code.clone(),
        };
        if let Err(e) = self.send_to_host(&greeting) {
            tracing::warn!("❌ Failed to send greeting: {}", e);
        }
    }

    fn handle_message(&mut self, message: WireMessage) {
        match message {
            WireMessage::Welcome {
                host_device_id,
                config,
                roster,
                assignments,
                round_state,
                protocol_version,
            } => {
                if protocol_version != PROTOCOL_VERSION {
                    tracing::debug!("🚫 Welcome with foreign protocol version, dropped");
                    return;
                }
                let cleared_pending = self.resync.note_snapshot();
                self.mirror
                    .apply_welcome(host_device_id, config, roster, assignments, round_state);
                self.local_turns.clear();

                if self.phase != HandshakePhase::Established {
                    self.phase = HandshakePhase::Established;
                    tracing::info!("✅ Joined session {}", self.session_code);
                    self.events.push(SessionEvent::Established);
                }
                if cleared_pending {
                    self.events.push(SessionEvent::ResyncPending(false));
                }
                self.events.push(SessionEvent::StateUpdated);
            }
            WireMessage::RoundStateSnapshot { state } => {
                if !self.is_established() {
                    tracing::debug!("🚫 Snapshot before welcome, dropped");
                    return;
                }
                let cleared_pending = self.resync.note_snapshot();
                if self.mirror.apply_snapshot(state) {
                    self.drop_finished_local_turns();
                    self.events.push(SessionEvent::StateUpdated);
                    if let Some(round) = self.mirror.round() {
                        if round.phase == RoundPhase::GameOver {
                            let winner = self
                                .mirror
                                .roster()
                                .iter()
                                .max_by_key(|p| p.total_score)
                                .map(|p| p.id);
                            self.events.push(SessionEvent::GameOver { winner });
                        }
                    }
                }
                if cleared_pending {
                    self.events.push(SessionEvent::ResyncPending(false));
                }
            }
            WireMessage::RoundStarted { number } => {
                if self.is_established() {
                    self.events.push(SessionEvent::RoundStarted { number });
                }
            }
            WireMessage::ForceAdvance { reason } => {
                if self.is_established() {
                    self.events.push(SessionEvent::RoundForced { reason });
                }
            }
            WireMessage::TurnProgress {
                player_id,
                progress,
                ..
            } => {
                if self.is_established() {
                    self.mirror.note_spectate(player_id, progress);
                    self.events.push(SessionEvent::StateUpdated);
                }
            }
            WireMessage::Ping => {
                let _ = self.send_to_host(&WireMessage::Pong);
            }
            WireMessage::Pong => {}
            other => {
                tracing::debug!(
                    "🚫 Ignoring client-only message from host: {:?}",
                    std::mem::discriminant(&other)
                );
            }
        }
    }

    /// Forget local turns the host already resolved
    fn drop_finished_local_turns(&mut self) {
        let mirror = &self.mirror;
        self.local_turns.retain(|player_id| {
            mirror
                .status(player_id)
                .map(|s| !s.status.is_terminal())
                .unwrap_or(false)
        });
    }

    fn send_ping_if_due(&mut self) {
        if !self.is_established() {
            return;
        }
        let due = self
            .last_ping
            .map(|at| at.elapsed() >= self.ping_interval)
            .unwrap_or(true);
        if due {
            let _ = self.send_to_host(&WireMessage::Ping);
            self.last_ping = Some(Instant::now());
        }
    }

    fn send_to_host(&mut self, message: &WireMessage) -> Result<()> {
        let host = self.host_peer.ok_or(P2PError::NotConnectedToHost)?;
        let data = message.encode()?;
        self.transport.send_to(host, data, message.delivery_mode())
    }
}
