mod support;

use farkle_session_core::{GameConfig, RoundPhase, TurnOutcome, TurnProgress, TurnStatus};
use farkle_session_p2p::{ClientSessionLoop, HostCommand, HostSessionLoop, SessionEvent};
use support::{client_loop, create_hub, host_loop, pump, MemoryTransport};
use uuid::Uuid;

struct Session {
    host: HostSessionLoop<MemoryTransport>,
    alice: ClientSessionLoop<MemoryTransport>,
    bob: ClientSessionLoop<MemoryTransport>,
    bob_handle: MemoryTransport,
    alice_id: Uuid,
    bob_id: Uuid,
}

/// Host plus two joined clients, each controlling one player, game started
fn started_session(winning_score: u32) -> Session {
    let hub = create_hub();
    let (mut host, _) = host_loop(
        &hub,
        GameConfig::default()
            .without_opening_threshold()
            .with_winning_score(winning_score),
    );
    let (mut alice, _) = client_loop(&hub, "Alice's phone", host.session_code().clone());
    let (mut bob, bob_handle) = client_loop(&hub, "Bob's tablet", host.session_code().clone());

    alice.join(host.local_peer_id()).unwrap();
    bob.join(host.local_peer_id()).unwrap();
    pump(&mut host, &mut [&mut alice, &mut bob]);
    assert!(alice.is_established() && bob.is_established());

    host.apply_command(HostCommand::AddPlayer {
        name: "Alice".to_string(),
        device_id: alice.device_id().clone(),
    });
    host.apply_command(HostCommand::AddPlayer {
        name: "Bob".to_string(),
        device_id: bob.device_id().clone(),
    });
    host.start_game();
    pump(&mut host, &mut [&mut alice, &mut bob]);

    let roster = host.game().coordinator().roster();
    let alice_id = roster[0].id;
    let bob_id = roster[1].id;

    Session {
        host,
        alice,
        bob,
        bob_handle,
        alice_id,
        bob_id,
    }
}

impl Session {
    fn pump(&mut self) {
        pump(&mut self.host, &mut [&mut self.alice, &mut self.bob]);
    }
}

#[test]
fn test_submission_replicates_to_every_device() {
    let mut s = started_session(10_000);

    s.alice
        .submit_local_turn(s.alice_id, TurnOutcome::banked(350))
        .unwrap();
    s.pump();

    // Host applied it
    let host_view = s.host.game().coordinator();
    assert_eq!(host_view.player(&s.alice_id).unwrap().total_score, 350);

    // Bob's mirror sees it too
    let bob_view = s.bob.mirror();
    assert_eq!(bob_view.player(&s.alice_id).unwrap().total_score, 350);
    assert_eq!(
        bob_view.status(&s.alice_id).unwrap().status,
        TurnStatus::Submitted
    );
}

#[test]
fn test_round_completion_resets_statuses_everywhere() {
    let mut s = started_session(10_000);

    s.alice
        .submit_local_turn(s.alice_id, TurnOutcome::banked(350))
        .unwrap();
    s.bob
        .submit_local_turn(s.bob_id, TurnOutcome::banked(200))
        .unwrap();
    s.pump();

    assert_eq!(s.host.game().coordinator().round().round_number, 2);

    for mirror in [s.alice.mirror(), s.bob.mirror()] {
        let round = mirror.round().unwrap();
        assert_eq!(round.round_number, 2);
        assert!(round.submitted_results.is_empty());
        assert_eq!(round.status(&s.alice_id), Some(TurnStatus::Pending));
        assert_eq!(round.status(&s.bob_id), Some(TurnStatus::Pending));
        // Totals survive the reset
        assert_eq!(mirror.player(&s.alice_id).unwrap().total_score, 350);
    }

    let round_started = s
        .alice
        .drain_events()
        .into_iter()
        .any(|event| matches!(event, SessionEvent::RoundStarted { number: 2 }));
    assert!(round_started);
}

#[test]
fn test_final_round_example_scenario() {
    let mut s = started_session(10_000);

    // Round 1: Alice reaches 9500
    s.alice
        .submit_local_turn(s.alice_id, TurnOutcome::banked(9_500))
        .unwrap();
    s.bob
        .submit_local_turn(s.bob_id, TurnOutcome::banked(300))
        .unwrap();
    s.pump();

    // Round 2: Alice banks 600 → final round at 10100
    s.alice
        .submit_local_turn(s.alice_id, TurnOutcome::banked(600))
        .unwrap();
    s.pump();

    let host_round = s.host.game().coordinator().round();
    assert!(host_round.is_final_round);
    assert_eq!(host_round.final_round_trigger, Some(s.alice_id));
    assert_eq!(
        s.host
            .game()
            .coordinator()
            .player(&s.alice_id)
            .unwrap()
            .total_score,
        10_100
    );

    // Bob farkles: no re-trigger, streak 1, game over
    s.bob.drain_events();
    s.bob
        .submit_local_turn(s.bob_id, TurnOutcome::farkle())
        .unwrap();
    s.pump();

    let coordinator = s.host.game().coordinator();
    assert_eq!(coordinator.round().phase, RoundPhase::GameOver);
    assert_eq!(coordinator.round().final_round_trigger, Some(s.alice_id));
    assert_eq!(
        coordinator.player(&s.bob_id).unwrap().consecutive_farkles,
        1
    );
    assert_eq!(coordinator.winner().unwrap().id, s.alice_id);

    // Bob's mirror agrees and his device heard the game is over
    assert_eq!(
        s.bob.mirror().round().unwrap().phase,
        RoundPhase::GameOver
    );
    let game_over = s.bob.drain_events().into_iter().find_map(|event| match event {
        SessionEvent::GameOver { winner } => Some(winner),
        _ => None,
    });
    assert_eq!(game_over, Some(Some(s.alice_id)));
}

#[test]
fn test_spoofed_submission_is_dropped() {
    let mut s = started_session(10_000);

    // Bob's device tries to submit for Alice's player
    s.bob
        .submit_local_turn(s.alice_id, TurnOutcome::banked(5_000))
        .unwrap();
    s.host.drain_events();
    s.pump();

    let coordinator = s.host.game().coordinator();
    assert_eq!(coordinator.player(&s.alice_id).unwrap().total_score, 0);
    assert_eq!(
        coordinator.round().status(&s.alice_id),
        Some(TurnStatus::Pending)
    );

    let rejected = s
        .host
        .drain_events()
        .into_iter()
        .any(|event| matches!(event, SessionEvent::ActionRejected { .. }));
    assert!(rejected);
}

#[test]
fn test_disconnected_device_players_are_skipped() {
    let mut s = started_session(10_000);

    s.alice
        .submit_local_turn(s.alice_id, TurnOutcome::banked(350))
        .unwrap();
    s.pump();
    s.host.drain_events();

    // Bob's link dies mid-round; grace period is zero in tests
    s.bob_handle.drop_link(s.host.local_peer_id());
    for _ in 0..4 {
        s.host.poll();
    }

    // Bob was skipped, which completed the round
    let coordinator = s.host.game().coordinator();
    assert_eq!(coordinator.round().round_number, 2);
    assert_eq!(coordinator.player(&s.bob_id).unwrap().total_score, 0);
    assert_eq!(coordinator.player(&s.alice_id).unwrap().total_score, 350);

    let left = s
        .host
        .drain_events()
        .into_iter()
        .any(|event| matches!(event, SessionEvent::PeerLeft { .. }));
    assert!(left);
}

#[test]
fn test_turn_progress_reaches_spectators_and_clears() {
    let mut s = started_session(10_000);

    s.alice.start_local_turn(s.alice_id).unwrap();
    let progress = TurnProgress {
        current_roll: vec![1, 3, 4, 6, 2, 5],
        selected_dice: vec![1, 5],
        running_score: 150,
        roll_count: 1,
        remaining_dice: 4,
    };
    s.alice
        .broadcast_progress(s.alice_id, progress.clone())
        .unwrap();
    s.pump();

    // Host stored the latest progress, Bob's device can spectate it
    assert_eq!(
        s.host
            .game()
            .coordinator()
            .spectate_progress(&s.alice_id),
        Some(&progress)
    );
    assert_eq!(s.bob.mirror().spectate_progress(&s.alice_id), Some(&progress));
    assert_eq!(
        s.bob.mirror().status(&s.alice_id).unwrap().status,
        TurnStatus::InProgress
    );

    // Submission clears the live progress
    s.alice
        .submit_local_turn(s.alice_id, TurnOutcome::banked(150))
        .unwrap();
    s.pump();

    assert!(s
        .host
        .game()
        .coordinator()
        .spectate_progress(&s.alice_id)
        .is_none());
    assert!(s.bob.mirror().spectate_progress(&s.alice_id).is_none());
}
