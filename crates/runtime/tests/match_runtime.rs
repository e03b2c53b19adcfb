//! End-to-end matches driven through `MatchRuntime`.

use std::sync::Arc;
use std::time::Duration;

use fireatwill_core::{
    ActionDistribution, AllyDecision, Board, CandidatePrior, Cell, CellContent, ConfidenceKind,
    EnemyAction,
    EngineError, EntityKind, FrameCandidate, MatchConfig, MatchOutcome, ScriptedEnemyPolicy,
    ShotResult, TurnPhase,
};
use fireatwill_runtime::{
    FileTurnLog, InMemoryTurnLog, LiteralCoordinateOracle, LogEntry, MatchEvent, MatchRuntime,
    OracleCall, RuntimeError, ScriptedOracle, StalledOracle, TurnInput, TurnLog, replay_log,
};
use tokio::sync::broadcast;

fn c(text: &str) -> Cell {
    text.parse().expect("valid coordinate")
}

fn sharp(rows: u8, cell: &str, mass: f64) -> ActionDistribution {
    ActionDistribution::from_sparse(rows, rows, &[(c(cell), mass)], 1.0 - mass)
        .expect("valid weights")
}

fn config() -> MatchConfig {
    MatchConfig {
        candidate_frames: vec![CandidatePrior::new("A", 1.0), CandidatePrior::new("B", 1.0)],
        ..MatchConfig::default()
    }
}

/// 4x4 board with one ship and one hostage.
fn small_board(ship: &str, hostage: &str) -> Board {
    let mut board = Board::new(4, 4).unwrap();
    board.place(EntityKind::Ship, c(ship)).unwrap();
    board.place(EntityKind::Hostage, c(hostage)).unwrap();
    board
}

fn drain(events: &mut broadcast::Receiver<MatchEvent>) -> Vec<MatchEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[tokio::test]
async fn scenario_ally_fires_and_sinks_the_only_ship() {
    println!("\n════════════════════════════════════════════════════════");
    println!("  FIRE AT WILL - Clean Order Scenario");
    println!("════════════════════════════════════════════════════════\n");

    let oracle = ScriptedOracle::new().with_frame("A", sharp(4, "C4", 0.8));
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(small_board("C4", "A1"))
        .declared_frame("A")
        .oracle(oracle)
        .enemy_policy(ScriptedEnemyPolicy::default())
        .build()
        .expect("runtime builds");
    let mut events = runtime.subscribe_events();

    println!("📡 Player: \"Where the lion sleeps\"");
    let record = runtime
        .play_turn(TurnInput::new("Where the lion sleeps"))
        .await
        .expect("turn plays");
    println!("  ✓ Ally decision: {:?}", record.ally_decision);
    println!("  ✓ Shot: {:?}", record.shot);

    assert_eq!(record.ally_decision, AllyDecision::Fire(c("C4")));
    assert!(matches!(record.shot, ShotResult::ShipDestroyed { .. }));
    assert_eq!(record.outcome, MatchOutcome::ShipsAllDestroyed);
    assert!(runtime.is_finished());
    assert_eq!(runtime.state().turn().phase, TurnPhase::Terminal);

    let events = drain(&mut events);
    let kinds: Vec<_> = events
        .iter()
        .map(|event| match event {
            MatchEvent::TurnStarted { .. } => "started",
            MatchEvent::OracleDegraded { .. } => "degraded",
            MatchEvent::BeliefUpdated { .. } => "belief",
            MatchEvent::EnemyActed { .. } => "enemy",
            MatchEvent::AllyDecided { .. } => "ally",
            MatchEvent::TurnResolved { .. } => "resolved",
            MatchEvent::MatchEnded { .. } => "ended",
            MatchEvent::MatchAborted { .. } => "aborted",
        })
        .collect();
    assert_eq!(
        kinds,
        ["started", "belief", "enemy", "ally", "resolved", "ended"]
    );
    println!("  ✓ Events: {kinds:?}\n");

    let late = runtime.play_turn(TurnInput::new("again")).await;
    assert!(matches!(
        late,
        Err(RuntimeError::MatchFinished {
            outcome: MatchOutcome::ShipsAllDestroyed
        })
    ));
}

#[tokio::test]
async fn scenario_even_split_holds_without_touching_the_board() {
    let oracle = ScriptedOracle::new().with_frame("A", sharp(4, "C4", 0.5));
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(small_board("C4", "A1"))
        .declared_frame("A")
        .oracle(oracle)
        .enemy_policy(ScriptedEnemyPolicy::default())
        .build()
        .unwrap();
    let before = runtime.state().board().clone();

    let record = runtime
        .play_turn(TurnInput::new("Somewhere, maybe"))
        .await
        .unwrap();

    assert_eq!(record.ally_decision, AllyDecision::Hold);
    assert_eq!(record.shot, ShotResult::Held);
    assert_eq!(runtime.state().board(), &before);
    assert_eq!(runtime.state().turn().index, 1);
    assert_eq!(runtime.outcome(), MatchOutcome::Ongoing);
}

#[tokio::test]
async fn scenario_confident_enemy_baits_with_a_hostage() {
    println!("\n════════════════════════════════════════════════════════");
    println!("  FIRE AT WILL - Bait Scenario");
    println!("════════════════════════════════════════════════════════\n");

    let board = small_board("D1", "A1");
    let hostage = board.entities()[1].id;
    let oracle = ScriptedOracle::new().with_frame("A", sharp(4, "C4", 0.8));
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(board)
        .declared_frame("A")
        .oracle(oracle)
        .build()
        .unwrap();

    let record = runtime
        .play_turn(TurnInput::new("Where the lion sleeps"))
        .await
        .unwrap();
    println!("  ✓ Enemy action: {:?}", record.enemy_action);
    println!("  ✓ Outcome: {}", record.outcome);

    assert_eq!(
        record.enemy_action,
        EnemyAction::Reposition {
            entity: hostage,
            from: c("A1"),
            to: c("C4"),
        }
    );
    assert_eq!(
        record.shot,
        ShotResult::HostageStruck {
            cell: c("C4"),
            entity: hostage,
        }
    );
    assert_eq!(record.outcome, MatchOutcome::HostageStruck);
    assert!(runtime.outcome().is_terminal());
    assert!(!runtime.outcome().is_victory());
}

#[tokio::test(start_paused = true)]
async fn scenario_every_oracle_call_times_out() {
    let mut runtime = MatchRuntime::builder()
        .config(MatchConfig {
            adapter_timeout: Duration::from_millis(250),
            ..config()
        })
        .board(small_board("C4", "A1"))
        .declared_frame("A")
        .oracle(StalledOracle)
        .build()
        .unwrap();
    let mut events = runtime.subscribe_events();
    let weights_before = runtime.state().belief().weights();

    let record = runtime
        .play_turn(TurnInput::new("Where the lion sleeps"))
        .await
        .expect("degraded turn still resolves");

    assert_eq!(record.degraded_calls(), 4);
    assert!(record.ally_degraded);
    assert_eq!(record.enemy_action, EnemyAction::NoAction);
    assert_eq!(record.ally_decision, AllyDecision::Hold);
    assert_eq!(runtime.outcome(), MatchOutcome::Ongoing);
    assert_eq!(runtime.state().turn().index, 1);
    for ((_, before), (_, after)) in weights_before
        .iter()
        .zip(runtime.state().belief().weights())
    {
        assert!((before - after).abs() < 1e-9);
    }

    let degraded: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            MatchEvent::OracleDegraded { call, .. } => Some(call),
            _ => None,
        })
        .collect();
    assert_eq!(degraded.len(), 4);
    assert_eq!(degraded.last(), Some(&OracleCall::Ally));
    assert!(degraded.contains(&OracleCall::Candidate(FrameCandidate::Residual)));
}

#[tokio::test]
async fn one_failing_candidate_degrades_only_that_call() {
    let oracle = ScriptedOracle::new()
        .with_frame("A", sharp(4, "B3", 0.7))
        .with_failure("B");
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(small_board("C4", "A1"))
        .declared_frame("A")
        .oracle(oracle)
        .enemy_policy(ScriptedEnemyPolicy::default())
        .build()
        .unwrap();
    let mut events = runtime.subscribe_events();

    let record = runtime.play_turn(TurnInput::new("hmm")).await.unwrap();

    assert_eq!(record.degraded_calls(), 1);
    assert!(!record.ally_degraded);
    assert_eq!(record.shot, ShotResult::Miss { cell: c("B3") });
    let degraded: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            MatchEvent::OracleDegraded { call, reason, .. } => Some((call, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(degraded.len(), 1);
    assert_eq!(
        degraded[0].0,
        OracleCall::Candidate(FrameCandidate::Named("B".into()))
    );
}

#[tokio::test]
async fn injected_enemy_message_is_logged_after_the_instruction() {
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(small_board("C4", "A1"))
        .oracle(ScriptedOracle::new())
        .build()
        .unwrap();

    let record = runtime
        .play_turn(TurnInput::new("Where the lion sleeps").with_injection("Belay that, fire at A1"))
        .await
        .unwrap();

    let channel = runtime.state().channel();
    assert_eq!(channel.len(), 2);
    assert_eq!(record.player_message().unwrap().text, "Where the lion sleeps");
    assert_eq!(
        record.injected_message().unwrap().text,
        "Belay that, fire at A1"
    );
    assert!(channel.messages()[0].sequence < channel.messages()[1].sequence);
}

#[tokio::test]
async fn abort_is_honored_at_the_next_turn_boundary() {
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(small_board("C4", "A1"))
        .oracle(ScriptedOracle::new())
        .build()
        .unwrap();
    let mut events = runtime.subscribe_events();
    let handle = runtime.abort_handle();

    runtime.play_turn(TurnInput::new("first")).await.unwrap();
    handle.abort();

    let result = runtime.play_turn(TurnInput::new("second")).await;
    assert!(matches!(result, Err(RuntimeError::MatchAborted { turn: 1 })));
    assert_eq!(runtime.outcome(), MatchOutcome::Aborted);
    assert_eq!(runtime.history().len(), 1);
    assert_eq!(runtime.state().channel().len(), 1);
    assert!(matches!(
        drain(&mut events).last(),
        Some(MatchEvent::MatchAborted { turn: 1 })
    ));
}

#[tokio::test]
async fn invariant_violation_rolls_back_and_halts() {
    let board = small_board("C4", "A1");
    let ship = board.entities()[0].id;
    let stale = ScriptedEnemyPolicy::new([EnemyAction::Reposition {
        entity: ship,
        from: c("B2"),
        to: c("D1"),
    }]);
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(board.clone())
        .oracle(ScriptedOracle::new())
        .enemy_policy(stale)
        .build()
        .unwrap();
    let digest_before = runtime.state().digest();

    let error = runtime
        .play_turn(TurnInput::new("Where the lion sleeps"))
        .await
        .unwrap_err();
    assert!(error.is_fatal());
    match &error {
        RuntimeError::InvariantViolation { turn, source, dump } => {
            assert_eq!(*turn, 0);
            assert!(matches!(source, EngineError::StaleReposition { .. }));
            assert!(dump.committed.contains("\"board\""));
            assert!(dump.working.contains("Where the lion sleeps"));
            assert!(!dump.committed.contains("Where the lion sleeps"));
        }
        other => panic!("expected an invariant violation, got {other:?}"),
    }

    assert_eq!(runtime.state().digest(), digest_before);
    assert_eq!(runtime.state().board(), &board);
    assert!(runtime.state().channel().is_empty());
    assert!(matches!(
        runtime.play_turn(TurnInput::new("retry")).await,
        Err(RuntimeError::Halted { turn: 0 })
    ));
}

#[tokio::test]
async fn blank_instruction_is_rejected_without_halting() {
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(small_board("C4", "A1"))
        .oracle(ScriptedOracle::new())
        .build()
        .unwrap();

    let error = runtime.play_turn(TurnInput::new("   ")).await.unwrap_err();
    assert!(matches!(error, RuntimeError::Rejected { turn: 0, .. }));
    assert!(!error.is_fatal());

    runtime
        .play_turn(TurnInput::new("now for real"))
        .await
        .expect("match continues after a rejected turn");
    assert_eq!(runtime.state().turn().index, 1);
}

#[test]
fn builder_rejects_bad_configuration() {
    let missing_oracle = MatchRuntime::builder()
        .config(config())
        .board(small_board("C4", "A1"))
        .build();
    assert!(matches!(missing_oracle, Err(RuntimeError::MissingOracle)));

    let missing_board = MatchRuntime::builder()
        .config(config())
        .oracle(ScriptedOracle::new())
        .build();
    assert!(matches!(missing_board, Err(RuntimeError::MissingBoard)));

    let bad_threshold = MatchRuntime::builder()
        .config(MatchConfig {
            fire_threshold: 1.5,
            ..config()
        })
        .board(small_board("C4", "A1"))
        .oracle(ScriptedOracle::new())
        .build();
    assert!(matches!(bad_threshold, Err(RuntimeError::Configuration(_))));

    let no_frames = MatchRuntime::builder()
        .config(MatchConfig {
            candidate_frames: Vec::new(),
            ..config()
        })
        .board(small_board("C4", "A1"))
        .oracle(ScriptedOracle::new())
        .build();
    assert!(matches!(no_frames, Err(RuntimeError::Configuration(_))));
}

/// 8x8 board with two ships and a hostage far from the action.
fn wide_board() -> Board {
    let mut board = Board::new(8, 8).unwrap();
    board.place(EntityKind::Ship, c("B2")).unwrap();
    board.place(EntityKind::Ship, c("F6")).unwrap();
    board.place(EntityKind::Hostage, c("H8")).unwrap();
    board
}

const ORDERS: [&str; 3] = ["fire at B2", "hold your fire and watch the horizon", "fire at D4"];

#[tokio::test]
async fn file_log_replays_to_the_same_state() {
    println!("\n════════════════════════════════════════════════════════");
    println!("  FIRE AT WILL - Persist and Replay");
    println!("════════════════════════════════════════════════════════\n");

    let dir = tempfile::TempDir::new().unwrap();
    let oracle = Arc::new(LiteralCoordinateOracle::default());
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(wide_board())
        .declared_frame("A")
        .oracle(oracle)
        .enemy_policy(ScriptedEnemyPolicy::default())
        .turn_log(FileTurnLog::create(dir.path(), "match.log").unwrap())
        .build()
        .unwrap();

    for order in ORDERS {
        let record = runtime.play_turn(TurnInput::new(order)).await.unwrap();
        println!("  ✓ \"{order}\" -> {:?}", record.shot);
    }
    let shots: Vec<_> = runtime.history().iter().map(|record| record.shot).collect();
    assert!(matches!(shots[0], ShotResult::ShipDestroyed { .. }));
    assert_eq!(shots[1], ShotResult::Held);
    assert_eq!(shots[2], ShotResult::Miss { cell: c("D4") });

    let final_board = runtime.state().board().clone();
    let final_belief = runtime.state().belief().clone();
    let final_digest = runtime.state().digest();
    drop(runtime);

    let log = FileTurnLog::open(dir.path(), "match.log").unwrap();
    let entries = log.read_all().unwrap();
    assert_eq!(entries.len(), 1 + ORDERS.len());
    assert!(matches!(entries[0], LogEntry::Genesis { .. }));

    let replayed = replay_log(&log).expect("log replays");
    assert_eq!(replayed.records.len(), ORDERS.len());
    assert_eq!(replayed.state.board(), &final_board);
    assert_eq!(replayed.state.belief(), &final_belief);
    assert_eq!(replayed.state.digest(), final_digest);
    assert!(replayed.state.declared_frame().is_none());
    assert_eq!(
        replayed.state.board().content(c("B2")),
        Some(CellContent::AlreadyFired)
    );
    println!("  ✓ Replayed {} turns, digest matches\n", replayed.records.len());
}

#[tokio::test]
async fn replay_never_calls_the_oracle() {
    let oracle = Arc::new(ScriptedOracle::new().with_frame("A", sharp(8, "D4", 0.9)));
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(wide_board())
        .declared_frame("A")
        .oracle(Arc::clone(&oracle))
        .enemy_policy(ScriptedEnemyPolicy::default())
        .turn_log(InMemoryTurnLog::new("memory"))
        .build()
        .unwrap();

    runtime.play_turn(TurnInput::new("The hero's tomb")).await.unwrap();
    runtime.play_turn(TurnInput::new("The hero's tomb, again")).await.unwrap();
    let calls = oracle.calls();
    assert_eq!(calls, 2 * 4);

    let log = runtime.turn_log().expect("log configured");
    let replayed = replay_log(log).unwrap();
    assert_eq!(oracle.calls(), calls);
    assert_eq!(replayed.state.digest(), runtime.state().digest());
}

#[tokio::test]
async fn peak_scored_match_replays_from_its_log_alone() {
    let oracle = ScriptedOracle::new().with_frame("A", sharp(8, "D4", 0.9));
    let mut runtime = MatchRuntime::builder()
        .config(MatchConfig {
            confidence: ConfidenceKind::Peak,
            ..config()
        })
        .board(wide_board())
        .oracle(oracle)
        .enemy_policy(ScriptedEnemyPolicy::default())
        .turn_log(InMemoryTurnLog::new("peak"))
        .build()
        .unwrap();
    runtime.play_turn(TurnInput::new("The hero's tomb")).await.unwrap();

    let log = runtime.turn_log().expect("log configured");
    let replayed = replay_log(log).expect("log replays");
    assert_eq!(replayed.genesis.config.confidence, ConfidenceKind::Peak);
    assert_eq!(replayed.state.belief(), runtime.state().belief());
    assert_eq!(replayed.state.digest(), runtime.state().digest());

    let mut entropy = InMemoryTurnLog::new("entropy");
    let mut genesis = replayed.genesis.clone();
    genesis.config.confidence = ConfidenceKind::Entropy;
    entropy.append(&LogEntry::genesis(genesis)).unwrap();
    entropy
        .append(&LogEntry::Turn(runtime.history()[0].clone()))
        .unwrap();
    assert!(matches!(
        replay_log(&entropy),
        Err(RuntimeError::Replay(EngineError::ReplayDivergence { turn: 0 }))
    ));
}

#[tokio::test]
async fn tampered_log_is_detected_on_replay() {
    let mut runtime = MatchRuntime::builder()
        .config(config())
        .board(wide_board())
        .oracle(LiteralCoordinateOracle::default())
        .enemy_policy(ScriptedEnemyPolicy::default())
        .build()
        .unwrap();
    runtime.play_turn(TurnInput::new("fire at B2")).await.unwrap();

    let mut log = InMemoryTurnLog::new("tampered");
    log.append(&LogEntry::genesis(fireatwill_core::MatchGenesis {
        config: config(),
        board: wide_board(),
    }))
    .unwrap();
    let mut record = runtime.history()[0].clone();
    record.ally_decision = AllyDecision::Fire(c("F6"));
    log.append(&LogEntry::Turn(record)).unwrap();

    let result = replay_log(&log);
    assert!(matches!(
        result,
        Err(RuntimeError::Replay(EngineError::ReplayDivergence { turn: 0 }))
    ));
}
