//! Writes run logs while a session is being played.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use balatrobot_client::BalatroClient;
use balatrobot_protocol::{ApiRequest, GameState, JsonlLogEntry};
use balatrobot_transport::Connection;
use serde_json::{json, Value};
use tracing::debug;

use crate::ReplayError;

/// Records every successful call made through it as a [`JsonlLogEntry`].
///
/// Each entry carries the game state observed right before the call. The
/// first call fetches it with `get_game_state`; afterwards the previous
/// reply is used, so a recorded session never contains a state the peer
/// didn't report. Failed calls are not recorded.
///
/// Calls whose reply is not a game state (`get_save_info`, for one) are
/// passed through but left out of the log, and the state for the next
/// entry is fetched again.
pub struct Recorder<W: Write> {
    writer: W,
    last_state: Option<Value>,
    entries: usize,
}

impl Recorder<BufWriter<File>> {
    /// Creates (or truncates) a JSONL file, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "recording run");
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> Recorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last_state: None,
            entries: 0,
        }
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Makes a call through `client` and records it.
    pub async fn call<C: Connection>(
        &mut self,
        client: &mut BalatroClient<C>,
        name: &str,
        arguments: Value,
    ) -> Result<Value, ReplayError> {
        let step = self.entries + 1;
        let client_err = |call: &str| {
            let call = call.to_string();
            move |source| ReplayError::Client { step, call, source }
        };

        let before = match self.last_state.take() {
            Some(state) => state,
            None => client
                .call("get_game_state", json!({}))
                .await
                .map_err(client_err("get_game_state"))?,
        };

        let reply = match client.call(name, arguments.clone()).await {
            Ok(reply) => reply,
            Err(e) => {
                self.last_state = Some(before);
                return Err(client_err(name)(e));
            }
        };

        if let Err(e) = GameState::from_value(reply.clone()) {
            debug!(call = name, error = %e, "reply is not a game state; call not recorded");
            return Ok(reply);
        }

        let function = ApiRequest::new(name, arguments)
            .map_err(|source| ReplayError::InvalidEntry { line: step, source })?;
        self.record(&JsonlLogEntry {
            timestamp_ms: now_ms(),
            function,
            game_state: before,
        })?;
        self.last_state = Some(reply.clone());
        Ok(reply)
    }

    /// Appends one entry and flushes.
    pub fn record(&mut self, entry: &JsonlLogEntry) -> Result<(), ReplayError> {
        serde_json::to_writer(&mut self.writer, entry).map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.entries += 1;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
