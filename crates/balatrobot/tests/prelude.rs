//! The facade's prelude and unified error against a mock peer.

use balatrobot::prelude::*;
use balatrobot_mock_peer::MockPeer;

async fn start_and_break(port: u16) -> Result<GameState, Error> {
    let mut client: BalatroClient = BalatroClient::builder()
        .port(port)
        .path_translator(PathTranslator::identity())
        .build();
    client.connect().await?;
    let state = client
        .start_run(&StartRunRequest::new(Deck::Red).stake(Stake::White).seed("EXAMPLE"))
        .await?;
    assert_eq!(state.state, State::BlindSelect);
    // cashing out during blind selection is refused by the game
    client.cash_out().await?;
    Ok(state)
}

#[tokio::test]
async fn test_client_errors_convert_with_question_mark() {
    let peer = MockPeer::start().await.unwrap();

    let err = start_and_break(peer.port()).await.unwrap_err();
    assert!(matches!(err, Error::Client(_)));
    assert_eq!(err.code(), Some(ErrorCode::InvalidGameState));
    assert_eq!(err.context()["current_state"], serde_json::json!(7));
    assert_eq!(peer.call_names(), ["start_run", "cash_out"]);
}

#[tokio::test]
async fn test_connect_refused_has_context() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = start_and_break(port).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ConnectionFailed));
    assert_eq!(err.context()["port"], serde_json::json!(port));
}
