//! Replays a recorded run against a live peer.
//!
//! Calls are issued in log order. After every call except the last, the
//! raw reply must equal the state recorded before the following call. The
//! first difference aborts the replay; nothing is retried. Every reply is
//! also checked against the game state schema.

use std::time::Duration;

use balatrobot_client::BalatroClient;
use balatrobot_protocol::GameState;
use balatrobot_transport::Connection;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{ReplayError, ReplayLog};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Pause before each call.
    pub delay: Duration,
}

impl ReplayOptions {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Outcome of a replay that matched the log to the end.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub steps: usize,
    /// The last reply, as sent by the peer.
    pub final_raw: Option<Value>,
    pub final_state: Option<GameState>,
}

#[derive(Debug, Clone, Default)]
pub struct Replayer {
    options: ReplayOptions,
}

impl Replayer {
    pub fn new(options: ReplayOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Replays `log` through `client`, which must already be connected.
    ///
    /// # Errors
    /// - `Client` if the peer rejects a call or the connection fails.
    /// - `Schema` if a reply is not a valid game state.
    /// - `Mismatch` on the first reply that differs from the log.
    pub async fn run<C: Connection>(
        &self,
        client: &mut BalatroClient<C>,
        log: &ReplayLog,
    ) -> Result<ReplayReport, ReplayError> {
        let entries = log.entries();
        info!(steps = entries.len(), "replay starting");

        let mut last: Option<(Value, GameState)> = None;
        for (idx, entry) in entries.iter().enumerate() {
            let step = idx + 1;
            let call = entry.function.name.as_str();
            if !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
            debug!(step, call, "replaying call");

            let actual = client
                .call(call, entry.function.arguments.clone())
                .await
                .map_err(|source| ReplayError::Client {
                    step,
                    call: call.to_string(),
                    source,
                })?;
            let parsed = GameState::from_value(actual.clone()).map_err(|source| {
                ReplayError::Schema {
                    step,
                    call: call.to_string(),
                    source,
                }
            })?;

            if let Some(next) = entries.get(idx + 1) {
                if actual != next.game_state {
                    warn!(step, call, "game state mismatch");
                    return Err(ReplayError::Mismatch {
                        step,
                        call: call.to_string(),
                        arguments: entry.function.arguments.clone(),
                        expected: Box::new(next.game_state.clone()),
                        actual: Box::new(actual),
                    });
                }
            }
            last = Some((actual, parsed));
        }

        info!(steps = entries.len(), "replay matched");
        let (final_raw, final_state) = last.unzip();
        Ok(ReplayReport {
            steps: entries.len(),
            final_raw,
            final_state,
        })
    }
}
