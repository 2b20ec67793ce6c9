//! The peer side of the bot poll loop.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use balatrobot_protocol::{ActionSchema, WireContract};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::lock;

const HELLO: &str = "HELLO";

/// What the peer does with one `HELLO`.
#[derive(Debug, Clone)]
pub enum Poll {
    /// Answer with this decision envelope.
    Decision(Value),
    /// Fail the poll: close the stream, or stay silent on a datagram
    /// socket so the bot times out.
    Hangup,
}

struct Shared {
    script: Mutex<VecDeque<Poll>>,
    actions: Mutex<Vec<Vec<u8>>>,
    polls: AtomicUsize,
    connections: AtomicUsize,
}

impl Shared {
    fn next_poll(&self) -> Option<Poll> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        lock(&self.script).pop_front()
    }
}

/// Answers `HELLO` polls from a script and records every action sent
/// back. Once the script runs out every poll is treated as
/// [`Poll::Hangup`].
pub struct DecisionPeer {
    addr: SocketAddr,
    contract: WireContract,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl DecisionPeer {
    /// A TCP peer for [`WireContract::Stream`] bots.
    pub async fn stream(
        script: impl IntoIterator<Item = Poll>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shared = Self::shared(script);
        let task = tokio::spawn(accept_loop(listener, shared.clone()));
        debug!(%addr, "decision peer listening (stream)");
        Ok(Self {
            addr,
            contract: WireContract::Stream,
            shared,
            task,
        })
    }

    /// A UDP peer for [`WireContract::Datagram`] bots.
    pub async fn datagram(
        script: impl IntoIterator<Item = Poll>,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let shared = Self::shared(script);
        let task = tokio::spawn(datagram_loop(socket, shared.clone()));
        debug!(%addr, "decision peer listening (datagram)");
        Ok(Self {
            addr,
            contract: WireContract::Datagram,
            shared,
            task,
        })
    }

    fn shared(script: impl IntoIterator<Item = Poll>) -> Arc<Shared> {
        Arc::new(Shared {
            script: Mutex::new(script.into_iter().collect()),
            actions: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
            connections: AtomicUsize::new(0),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Raw action payloads in arrival order.
    pub fn raw_actions(&self) -> Vec<Vec<u8>> {
        lock(&self.shared.actions).clone()
    }

    /// Received actions decoded with this peer's contract. Payloads that
    /// fail to decode are skipped.
    pub fn actions(&self) -> Vec<ActionSchema> {
        self.raw_actions()
            .iter()
            .filter_map(|raw| self.contract.decode_action(raw).ok())
            .collect()
    }

    /// `HELLO` polls received so far.
    pub fn polls(&self) -> usize {
        self.shared.polls.load(Ordering::SeqCst)
    }

    /// Accepted stream connections. Always zero for datagram peers.
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }
}

impl Drop for DecisionPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    while let Ok((stream, _)) = listener.accept().await {
        shared.connections.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(serve_stream(stream, shared.clone()));
    }
}

async fn serve_stream(stream: TcpStream, shared: Arc<Shared>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim() != HELLO {
            lock(&shared.actions).push(line.into_bytes());
            continue;
        }
        match shared.next_poll() {
            Some(Poll::Decision(v)) => {
                let mut out = v.to_string();
                out.push('\n');
                if writer.write_all(out.as_bytes()).await.is_err() {
                    return;
                }
            }
            Some(Poll::Hangup) | None => return,
        }
    }
}

async fn datagram_loop(socket: UdpSocket, shared: Arc<Shared>) {
    let mut buf = vec![0u8; 65536];
    while let Ok((n, from)) = socket.recv_from(&mut buf).await {
        let data = &buf[..n];
        if data != HELLO.as_bytes() {
            lock(&shared.actions).push(data.to_vec());
            continue;
        }
        if let Some(Poll::Decision(v)) = shared.next_poll() {
            if socket.send_to(v.to_string().as_bytes(), from).await.is_err() {
                return;
            }
        }
    }
}
