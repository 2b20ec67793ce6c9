//! Integration tests for the stream and datagram connections.
//!
//! Each test binds a real loopback socket on port 0 (the OS picks a free
//! port) and drives the peer side by hand in a spawned task.

use std::time::Duration;

use balatrobot_transport::{
    Connection, TcpConnection, TransportConfig, TransportError, UdpConnection,
    WireContract,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};

fn config_for(port: u16) -> TransportConfig {
    TransportConfig {
        port,
        timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

// =========================================================================
// TCP
// =========================================================================

#[tokio::test]
async fn test_tcp_send_line_and_receive_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let peer = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        write.write_all(b"{\"state\":11}").await.unwrap();
        line
    });

    let mut conn = TcpConnection::connect(&config_for(port)).await.unwrap();
    assert_eq!(TcpConnection::CONTRACT, WireContract::Stream);
    assert_eq!(conn.peer_addr().port(), port);

    conn.send(b"{\"name\":\"get_game_state\",\"arguments\":{}}\n")
        .await
        .unwrap();
    let reply = conn.recv().await.unwrap();
    assert_eq!(reply, b"{\"state\":11}");

    let line = peer.await.unwrap();
    assert_eq!(line, "{\"name\":\"get_game_state\",\"arguments\":{}}");
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_tcp_connect_refused_is_connect_failed() {
    // Bind then drop to get a port that is very likely closed.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = TcpConnection::connect(&config_for(port))
        .await
        .err()
        .expect("nothing should be listening");
    match err {
        TransportError::ConnectFailed { addr, .. } => {
            assert_eq!(addr, format!("127.0.0.1:{port}"));
        }
        other => panic!("expected ConnectFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_tcp_recv_times_out_on_silent_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let _peer = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let mut config = config_for(port);
    config.timeout = Duration::from_millis(100);
    let mut conn = TcpConnection::connect(&config).await.unwrap();
    let err = conn.recv().await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn test_tcp_peer_close_is_connection_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let mut conn = TcpConnection::connect(&config_for(port)).await.unwrap();
    peer.await.unwrap();
    let err = conn.recv().await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectionClosed(_)));
}

#[tokio::test]
async fn test_each_connection_gets_a_fresh_id() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let _peer = tokio::spawn(async move {
        let _a = listener.accept().await.unwrap();
        let _b = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
    });

    let a = TcpConnection::connect(&config_for(port)).await.unwrap();
    let b = TcpConnection::connect(&config_for(port)).await.unwrap();
    assert_ne!(a.id(), b.id());
}

// =========================================================================
// UDP
// =========================================================================

#[tokio::test]
async fn test_udp_datagram_exchange() {
    let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = peer.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        peer.send_to(b"{\"waitingFor\":\"start_run\"}", from)
            .await
            .unwrap();
        buf[..n].to_vec()
    });

    let mut conn = UdpConnection::connect(&config_for(port)).await.unwrap();
    assert_eq!(UdpConnection::CONTRACT, WireContract::Datagram);
    conn.send(b"HELLO").await.unwrap();
    let reply = conn.recv().await.unwrap();
    assert_eq!(reply, b"{\"waitingFor\":\"start_run\"}");
    assert_eq!(handle.await.unwrap(), b"HELLO");
}

#[tokio::test]
async fn test_udp_recv_times_out_without_peer_reply() {
    let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = peer.local_addr().unwrap().port();

    let mut config = config_for(port);
    config.timeout = Duration::from_millis(100);
    let mut conn = UdpConnection::connect(&config).await.unwrap();
    conn.send(b"HELLO").await.unwrap();
    let err = conn.recv().await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)));
    drop(peer);
}

#[tokio::test]
async fn test_udp_receive_buffer_follows_config() {
    let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = peer.local_addr().unwrap().port();

    let mut small = config_for(port);
    small.buffer_size = 16 * 1024;
    let mut large = config_for(port);
    large.buffer_size = 64 * 1024;

    let small = UdpConnection::connect(&small).await.unwrap();
    let large = UdpConnection::connect(&large).await.unwrap();
    let small_n = small.recv_buffer_size().unwrap();
    let large_n = large.recv_buffer_size().unwrap();

    assert!((16 * 1024..=4 * 16 * 1024).contains(&small_n), "got {small_n}");
    assert!(large_n >= 64 * 1024, "got {large_n}");
    assert!(small_n < large_n);
}
