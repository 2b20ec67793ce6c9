//! Recording a session against one mock peer and replaying it against
//! fresh ones.

use std::time::Duration;

use balatrobot_client::{BalatroClient, BalatroError, PathTranslator};
use balatrobot_mock_peer::MockPeer;
use balatrobot_protocol::{ErrorCode, State};
use balatrobot_replay::{
    Recorder, ReplayError, ReplayLog, ReplayOptions, ReplayReport, Replayer,
};
use serde_json::{json, Value};

async fn connected(peer: &MockPeer) -> BalatroClient {
    let mut client: BalatroClient = BalatroClient::builder()
        .port(peer.port())
        .timeout(Duration::from_millis(500))
        .path_translator(PathTranslator::identity())
        .build();
    client.connect().await.unwrap();
    client
}

fn session() -> Vec<(&'static str, Value)> {
    vec![
        ("go_to_menu", json!({})),
        ("start_run", json!({"deck": "Red Deck", "stake": 1, "seed": "EXAMPLE"})),
        ("skip_or_select_blind", json!({"action": "select"})),
        ("play_hand_or_discard", json!({"action": "discard", "cards": [0, 1]})),
        ("play_hand_or_discard", json!({"action": "play_hand", "cards": [0, 1, 2]})),
        ("cash_out", json!({})),
        ("shop", json!({"action": "next_round"})),
    ]
}

async fn record_session() -> ReplayLog {
    let peer = MockPeer::start().await.unwrap();
    let mut client = connected(&peer).await;
    let mut recorder = Recorder::new(Vec::new());
    for (name, args) in session() {
        recorder.call(&mut client, name, args).await.unwrap();
    }
    assert_eq!(recorder.entries(), 7);
    ReplayLog::from_reader(recorder.into_inner().as_slice()).unwrap()
}

async fn replay_fresh(log: &ReplayLog) -> (MockPeer, Result<ReplayReport, ReplayError>) {
    let peer = MockPeer::start().await.unwrap();
    let mut client = connected(&peer).await;
    let result = Replayer::default().run(&mut client, log).await;
    (peer, result)
}

// =========================================================================
// Recording
// =========================================================================

#[tokio::test]
async fn test_recorder_logs_state_before_each_call() {
    let log = record_session().await;
    let entries = log.entries();

    assert_eq!(entries[0].function.name, "go_to_menu");
    assert_eq!(entries[0].parsed_state().unwrap().state, State::Menu);
    assert_eq!(entries[1].parsed_state().unwrap().state, State::Menu);
    assert_eq!(entries[2].parsed_state().unwrap().state, State::BlindSelect);
    assert_eq!(entries[3].parsed_state().unwrap().state, State::SelectingHand);
    assert_eq!(entries[5].parsed_state().unwrap().state, State::RoundEval);
    assert_eq!(entries[6].parsed_state().unwrap().state, State::Shop);
    assert_eq!(
        entries[1].function.arguments,
        json!({"deck": "Red Deck", "stake": 1, "seed": "EXAMPLE"})
    );
}

#[tokio::test]
async fn test_failed_call_not_recorded() {
    let peer = MockPeer::start().await.unwrap();
    let mut client = connected(&peer).await;
    let mut recorder = Recorder::new(Vec::new());

    let err = recorder
        .call(&mut client, "cash_out", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::Client { step: 1, .. }));
    assert_eq!(recorder.entries(), 0);

    recorder.call(&mut client, "go_to_menu", json!({})).await.unwrap();
    assert_eq!(recorder.entries(), 1);
    // the state fetched before the failed call is reused
    assert_eq!(
        peer.call_names(),
        ["get_game_state", "cash_out", "go_to_menu"]
    );
}

#[tokio::test]
async fn test_record_to_file_then_replay() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("runs/session.jsonl");

    let peer = MockPeer::start().await.unwrap();
    let mut client = connected(&peer).await;
    let mut recorder = Recorder::create(&path).unwrap();
    for (name, args) in session().into_iter().take(3) {
        recorder.call(&mut client, name, args).await.unwrap();
    }
    drop(recorder);

    let log = ReplayLog::from_path(&path).unwrap();
    assert_eq!(log.len(), 3);
    let (_peer, result) = replay_fresh(&log).await;
    assert_eq!(result.unwrap().steps, 3);
}

#[tokio::test]
async fn test_save_info_query_left_out_of_log() {
    let peer = MockPeer::start().await.unwrap();
    let mut client = connected(&peer).await;
    let mut recorder = Recorder::new(Vec::new());

    recorder.call(&mut client, "go_to_menu", json!({})).await.unwrap();
    let args = json!({"deck": "Red Deck", "stake": 1, "seed": "EXAMPLE"});
    recorder.call(&mut client, "start_run", args).await.unwrap();
    let info = recorder
        .call(&mut client, "get_save_info", json!({}))
        .await
        .unwrap();
    assert_eq!(info["has_active_run"], json!(true));
    let args = json!({"action": "select"});
    recorder.call(&mut client, "skip_or_select_blind", args).await.unwrap();

    assert_eq!(recorder.entries(), 3);
    assert_eq!(
        peer.call_names(),
        [
            "get_game_state",
            "go_to_menu",
            "start_run",
            "get_save_info",
            "get_game_state",
            "skip_or_select_blind",
        ]
    );

    let log = ReplayLog::from_reader(recorder.into_inner().as_slice()).unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log.entries()[2].function.name, "skip_or_select_blind");
    assert_eq!(log.entries()[2].parsed_state().unwrap().state, State::BlindSelect);

    let (_peer, result) = replay_fresh(&log).await;
    assert_eq!(result.unwrap().steps, 3);
}

// =========================================================================
// Replaying
// =========================================================================

#[tokio::test]
async fn test_replay_is_idempotent() {
    let log = record_session().await;

    let (peer_a, first) = replay_fresh(&log).await;
    let (peer_b, second) = replay_fresh(&log).await;
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.steps, 7);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.final_raw).unwrap(),
        serde_json::to_string(&second.final_raw).unwrap()
    );
    assert_eq!(first.final_state.unwrap().state, State::BlindSelect);
    assert_eq!(peer_a.call_names(), peer_b.call_names());
    assert_eq!(peer_a.call_names().len(), 7);
}

#[tokio::test]
async fn test_mismatch_aborts_at_first_difference() {
    let log = record_session().await;
    let mut entries = log.entries().to_vec();
    entries[2].game_state["tampered"] = json!(true);
    let tampered = ReplayLog::new(entries);

    let (peer, result) = replay_fresh(&tampered).await;
    match result.unwrap_err() {
        ReplayError::Mismatch {
            step,
            call,
            expected,
            actual,
            ..
        } => {
            assert_eq!(step, 2);
            assert_eq!(call, "start_run");
            assert_eq!(expected["tampered"], json!(true));
            assert!(actual.get("tampered").is_none());
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert_eq!(peer.call_names(), ["go_to_menu", "start_run"]);
}

#[tokio::test]
async fn test_rejected_call_aborts_replay() {
    let text = r#"{"timestamp_ms":0,"function":{"name":"cash_out","arguments":{}},"game_state":{"state":11}}"#;
    let log = ReplayLog::from_reader(text.as_bytes()).unwrap();

    let (_peer, result) = replay_fresh(&log).await;
    let err = result.unwrap_err();
    assert_eq!(err.step(), Some(1));
    match err {
        ReplayError::Client { source, .. } => {
            assert!(matches!(source, BalatroError::Validation(_)));
            assert_eq!(source.code(), ErrorCode::InvalidGameState);
        }
        other => panic!("expected client error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_log_replays_trivially() {
    let (peer, result) = replay_fresh(&ReplayLog::default()).await;
    let report = result.unwrap();
    assert_eq!(report.steps, 0);
    assert!(report.final_state.is_none());
    assert!(peer.call_names().is_empty());
}

#[tokio::test]
async fn test_delay_between_steps() {
    let log = record_session().await;
    let peer = MockPeer::start().await.unwrap();
    let mut client = connected(&peer).await;

    let started = std::time::Instant::now();
    Replayer::new(ReplayOptions::default().with_delay(Duration::from_millis(20)))
        .run(&mut client, &log)
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(140));
}
