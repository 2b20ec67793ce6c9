//! The poll loop.
//!
//! Each [`Bot::step`] is one poll/decide/act cycle:
//!
//! ```text
//! HELLO ──► peer
//!       ◄── {"state": 7, "waitingForAction": true, "waitingFor": "skip_or_select_blind"}
//! strategy.skip_or_select_blind(..) → SELECT_BLIND
//! action ──► peer
//! ```
//!
//! Socket failures are the only recoverable errors. The failed socket is
//! discarded and a new one is opened on the next step, up to
//! [`RetryPolicy::max_consecutive`](crate::RetryPolicy) times in a row.

use balatrobot_protocol::{ActionSchema, State};
use balatrobot_transport::{Connection, TcpConnection, TransportConfig, TransportError};
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::{
    BotConfig, BotError, DecisionRequest, PeerMessage, StateCache, Strategy,
    WaitingFor,
};

const SEED_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SEED_LEN: usize = 7;

/// A fresh run seed: seven characters from `[0-9A-Z]`.
pub fn random_seed() -> String {
    let mut rng = rand::rng();
    (0..SEED_LEN)
        .map(|_| char::from(SEED_ALPHABET[rng.random_range(0..SEED_ALPHABET.len())]))
        .collect()
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// An action was chosen and sent.
    Acted {
        waiting_for: WaitingFor,
        action: ActionSchema,
    },
    /// The peer sent a status message.
    Response(serde_json::Value),
    /// The peer was not waiting for input.
    Idle,
    /// A socket failed and will be replaced on the next step.
    Reconnecting { attempt: u32 },
}

/// Totals for a finished [`Bot::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u64,
    pub actions: u64,
    pub reconnects: u64,
    /// Phase reported by the last decision request.
    pub final_state: Option<State>,
}

/// Drives a [`Strategy`] against one peer.
///
/// The connection type fixes the wire contract: [`TcpConnection`] sends
/// JSON actions, `UdpConnection` sends pipe-form actions.
pub struct Bot<S, C: Connection = TcpConnection> {
    strategy: S,
    config: BotConfig,
    transport: TransportConfig,
    conn: Option<C>,
    cache: Option<StateCache>,
    running: bool,
    failures: u32,
    last: Option<DecisionRequest>,
    summary: RunSummary,
}

impl<S: Strategy> Bot<S, TcpConnection> {
    /// A stream-contract bot.
    pub fn new(strategy: S, config: BotConfig, transport: TransportConfig) -> Self {
        Self::with_connection(strategy, config, transport)
    }
}

impl<S: Strategy, C: Connection> Bot<S, C> {
    /// A bot over any connection type.
    pub fn with_connection(
        strategy: S,
        config: BotConfig,
        transport: TransportConfig,
    ) -> Self {
        let config = config.validated();
        let cache = config.state_cache_dir.clone().map(StateCache::new);
        Self {
            strategy,
            config,
            transport: transport.validated(),
            conn: None,
            cache,
            running: false,
            failures: 0,
            last: None,
            summary: RunSummary::default(),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// The most recent decision request.
    pub fn last_decision(&self) -> Option<&DecisionRequest> {
        self.last.as_ref()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Steps until the peer reports game over.
    ///
    /// # Errors
    /// Anything [`step`](Self::step) returns. The socket is closed either way.
    pub async fn run(&mut self) -> Result<RunSummary, BotError> {
        self.running = true;
        self.summary = RunSummary::default();
        info!(
            deck = %self.config.deck,
            stake = self.config.stake.level(),
            contract = %C::CONTRACT,
            "bot run starting"
        );

        let result = loop {
            if !self.running {
                break Ok(());
            }
            if let Err(e) = self.step().await {
                break Err(e);
            }
        };
        self.close().await;

        match result {
            Ok(()) => {
                info!(
                    steps = self.summary.steps,
                    actions = self.summary.actions,
                    reconnects = self.summary.reconnects,
                    "bot run finished"
                );
                Ok(self.summary.clone())
            }
            Err(e) => {
                error!(error = %e, steps = self.summary.steps, "bot run failed");
                Err(e)
            }
        }
    }

    /// One poll, decision and action.
    ///
    /// A game-over decision clears the running flag; its action is still
    /// sent.
    pub async fn step(&mut self) -> Result<StepOutcome, BotError> {
        self.summary.steps += 1;

        let reply = match self.exchange_poll().await {
            Ok(reply) => reply,
            Err(e) => return self.on_socket_failure(e),
        };
        self.failures = 0;

        let req = match PeerMessage::parse(&reply)? {
            PeerMessage::Response(text) => {
                info!(response = %text, "peer response");
                return Ok(StepOutcome::Response(text));
            }
            PeerMessage::Idle { state } => {
                debug!(?state, "peer not waiting for input");
                return Ok(StepOutcome::Idle);
            }
            PeerMessage::Decision(req) => req,
        };

        if req.is_game_over() {
            info!("peer reports game over; stopping after this action");
            self.running = false;
        }
        self.summary.final_state = Some(req.state);
        if let Some(cache) = &mut self.cache {
            cache.write(&req)?;
        }

        let waiting_for = req.waiting_for;
        let action = self.choose(&req)?;
        let bytes = C::CONTRACT.encode_action(&action)?;
        debug!(%waiting_for, action = %action.action, "sending action");
        self.last = Some(req);

        if let Err(e) = self.send(&bytes).await {
            return self.on_socket_failure(e);
        }
        self.summary.actions += 1;
        Ok(StepOutcome::Acted {
            waiting_for,
            action,
        })
    }

    /// Maps a decision to an action. Exhaustive over [`WaitingFor`].
    fn choose(&mut self, req: &DecisionRequest) -> Result<ActionSchema, BotError> {
        let s = &mut self.strategy;
        let action = match req.waiting_for {
            WaitingFor::StartRun => {
                let seed = self.config.seed.clone().unwrap_or_else(random_seed);
                info!(deck = %self.config.deck, %seed, "starting run");
                Some(ActionSchema::start_run(
                    self.config.stake,
                    self.config.deck,
                    seed,
                    self.config.challenge.clone(),
                ))
            }
            WaitingFor::SkipOrSelectBlind => s.skip_or_select_blind(req),
            WaitingFor::SelectCardsFromHand => s.select_cards_from_hand(req),
            WaitingFor::SelectShopAction => s.select_shop_action(req),
            WaitingFor::SelectBoosterAction => s.select_booster_action(req),
            WaitingFor::SellJokers => s.sell_jokers(req),
            WaitingFor::RearrangeJokers => s.rearrange_jokers(req),
            WaitingFor::UseOrSellConsumables => s.use_or_sell_consumables(req),
            WaitingFor::RearrangeConsumables => s.rearrange_consumables(req),
            WaitingFor::RearrangeHand => s.rearrange_hand(req),
        };
        action.ok_or_else(|| BotError::NoAction {
            waiting_for: req.waiting_for.to_string(),
        })
    }

    // -- socket -----------------------------------------------------------

    async fn exchange_poll(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.conn.is_none() {
            if self.failures > 0 {
                tokio::time::sleep(self.config.retry.backoff).await;
            }
            let conn = C::connect(&self.transport).await?;
            debug!(id = %conn.id(), "bot connected");
            self.conn = Some(conn);
        }
        let Some(conn) = self.conn.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        conn.send(C::CONTRACT.poll()).await?;
        conn.recv().await
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        match self.conn.as_mut() {
            Some(conn) => conn.send(bytes).await,
            None => Err(TransportError::NotConnected),
        }
    }

    fn on_socket_failure(
        &mut self,
        err: TransportError,
    ) -> Result<StepOutcome, BotError> {
        self.conn = None;
        self.failures += 1;
        let max = self.config.retry.max_consecutive;
        if self.failures > max || !err.is_retryable() {
            return Err(BotError::RetriesExhausted {
                attempts: self.failures,
                last: err,
            });
        }
        self.summary.reconnects += 1;
        warn!(
            error = %err,
            attempt = self.failures,
            max,
            "socket error; reconnecting"
        );
        Ok(StepOutcome::Reconnecting {
            attempt: self.failures,
        })
    }

    async fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!(
                    id = %conn.id(),
                    error = %e,
                    "close reported an error; socket dropped anyway"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balatrobot_protocol::Action;
    use serde_json::json;

    struct Silent;

    impl Strategy for Silent {
        fn skip_or_select_blind(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            Some(ActionSchema::new(Action::SelectBlind))
        }
        fn select_cards_from_hand(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
        fn select_shop_action(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
        fn select_booster_action(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
        fn sell_jokers(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
        fn rearrange_jokers(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
        fn use_or_sell_consumables(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
        fn rearrange_consumables(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
        fn rearrange_hand(&mut self, _: &DecisionRequest) -> Option<ActionSchema> {
            None
        }
    }

    fn request(state: State, waiting_for: WaitingFor) -> DecisionRequest {
        DecisionRequest {
            state,
            waiting_for,
            raw: json!({}),
        }
    }

    #[test]
    fn test_random_seed_shape() {
        for _ in 0..50 {
            let seed = random_seed();
            assert_eq!(seed.len(), SEED_LEN);
            assert!(seed.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_start_run_uses_config() {
        let config = BotConfig::default().seed("EXAMPLE");
        let mut bot = Bot::new(Silent, config, TransportConfig::default());
        let action = bot
            .choose(&request(State::Menu, WaitingFor::StartRun))
            .unwrap();
        assert_eq!(action.encode_pipe().unwrap(), "START_RUN|1|Red Deck|EXAMPLE|None");
    }

    #[test]
    fn test_missing_action_is_error() {
        let mut bot = Bot::new(Silent, BotConfig::default(), TransportConfig::default());
        let err = bot
            .choose(&request(State::Shop, WaitingFor::SelectShopAction))
            .unwrap_err();
        assert!(matches!(
            err,
            BotError::NoAction { waiting_for } if waiting_for == "select_shop_action"
        ));
    }

    #[test]
    fn test_dispatch_reaches_strategy() {
        let mut bot = Bot::new(Silent, BotConfig::default(), TransportConfig::default());
        let action = bot
            .choose(&request(State::BlindSelect, WaitingFor::SkipOrSelectBlind))
            .unwrap();
        assert_eq!(action.action, Action::SelectBlind);
    }

    #[test]
    fn test_new_bot_is_idle() {
        let bot = Bot::new(Silent, BotConfig::default(), TransportConfig::default());
        assert!(!bot.is_running());
        assert!(!bot.is_connected());
        assert!(bot.last_decision().is_none());
    }
}
