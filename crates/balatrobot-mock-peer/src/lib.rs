//! In-process peers for integration tests.
//!
//! [`MockPeer`] listens on an ephemeral TCP port and answers
//! newline-delimited requests, either from a [`GameSim`] or from a fixed
//! script of [`Reply`]s. [`DecisionPeer`] plays the other side of the bot
//! loop: it answers `HELLO` polls with decision envelopes and records the
//! actions it receives.
//!
//! Everything here binds to `127.0.0.1:0` and is torn down on drop.

mod decision;
mod sim;

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use decision::{DecisionPeer, Poll};
pub use sim::{DEFAULT_SAVE_PATH, GameSim};

/// One canned answer for a scripted peer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Serialized and sent followed by a newline.
    Json(Value),
    /// Sent exactly as given.
    Raw(Vec<u8>),
    /// Close the connection without answering.
    Hangup,
}

enum Mode {
    Game(GameSim),
    Script(VecDeque<Reply>),
}

struct Shared {
    mode: Mutex<Mode>,
    requests: Mutex<Vec<Value>>,
    connections: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A TCP peer speaking the stream request contract.
pub struct MockPeer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockPeer {
    /// Starts a peer backed by a fresh [`GameSim`] in the menu.
    pub async fn start() -> io::Result<Self> {
        Self::with_sim(GameSim::default()).await
    }

    /// Starts a peer backed by the given simulator.
    pub async fn with_sim(sim: GameSim) -> io::Result<Self> {
        Self::spawn(Mode::Game(sim)).await
    }

    /// Starts a peer that answers the n-th request with the n-th reply.
    /// Once the script runs out, connections are closed.
    pub async fn scripted(
        replies: impl IntoIterator<Item = Reply>,
    ) -> io::Result<Self> {
        Self::spawn(Mode::Script(replies.into_iter().collect())).await
    }

    async fn spawn(mode: Mode) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shared = Arc::new(Shared {
            mode: Mutex::new(mode),
            requests: Mutex::new(Vec::new()),
            connections: AtomicUsize::new(0),
        });

        let task = tokio::spawn(accept_loop(listener, shared.clone()));
        debug!(%addr, "mock peer listening");
        Ok(Self { addr, shared, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every request received so far, decoded. Lines that were not JSON
    /// are recorded as strings.
    pub fn requests(&self) -> Vec<Value> {
        lock(&self.shared.requests).clone()
    }

    /// Names of the calls received so far.
    pub fn call_names(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Number of accepted connections.
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// A copy of the simulator, or `None` for scripted peers.
    pub fn sim(&self) -> Option<GameSim> {
        match &*lock(&self.shared.mode) {
            Mode::Game(sim) => Some(sim.clone()),
            Mode::Script(_) => None,
        }
    }
}

impl Drop for MockPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                shared.connections.fetch_add(1, Ordering::SeqCst);
                debug!(%peer, "mock peer accepted connection");
                tokio::spawn(serve(stream, shared.clone()));
            }
            Err(e) => {
                warn!(error = %e, "mock peer accept failed");
                return;
            }
        }
    }
}

async fn serve(stream: TcpStream, shared: Arc<Shared>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let request = serde_json::from_str::<Value>(&line)
            .unwrap_or_else(|_| Value::String(line.clone()));
        lock(&shared.requests).push(request.clone());

        let reply = answer(&shared, &request);
        let bytes = match reply {
            Reply::Json(v) => {
                let mut s = v.to_string();
                s.push('\n');
                s.into_bytes()
            }
            Reply::Raw(b) => b,
            Reply::Hangup => return,
        };
        if writer.write_all(&bytes).await.is_err() {
            return;
        }
    }
}

fn answer(shared: &Shared, request: &Value) -> Reply {
    match &mut *lock(&shared.mode) {
        Mode::Game(sim) => {
            if request.is_string() {
                return Reply::Json(serde_json::json!({
                    "error": "Invalid JSON in request",
                    "error_code": "E001",
                }));
            }
            Reply::Json(sim.handle(request))
        }
        Mode::Script(replies) => replies.pop_front().unwrap_or(Reply::Hangup),
    }
}
