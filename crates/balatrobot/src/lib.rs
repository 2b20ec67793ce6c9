//! # BalatroBot
//!
//! Drive the card game Balatro from Rust through the BalatroBot mod.
//!
//! The game runs a mod that listens on a local socket. This crate bundles
//! everything needed to talk to it:
//!
//! - [`client`]: a request/response RPC client with typed calls
//!   (`start_run`, `play_hand_or_discard`, `shop`, ...).
//! - [`bot`]: a decision loop that asks a [`Strategy`](bot::Strategy)
//!   what to do whenever the game is waiting for input.
//! - [`checkpoint`]: save, list and restore copies of the game's save
//!   file.
//! - [`replay`]: record a session as JSONL and verify that replaying it
//!   reaches the same states.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use balatrobot::prelude::*;
//!
//! # async fn demo() -> Result<(), balatrobot::Error> {
//! balatrobot::init_tracing();
//! let mut client: BalatroClient = BalatroClient::builder().port(12346).build();
//! client.connect().await?;
//! let state = client
//!     .start_run(&StartRunRequest::new(Deck::Red).stake(Stake::White).seed("EXAMPLE"))
//!     .await?;
//! println!("now in {}", state.state);
//! # Ok(())
//! # }
//! ```

mod error;
mod logging;

pub use error::Error;
pub use logging::{init_tracing, DEFAULT_FILTER};

pub use balatrobot_bot as bot;
pub use balatrobot_checkpoint as checkpoint;
pub use balatrobot_client as client;
pub use balatrobot_protocol as protocol;
pub use balatrobot_replay as replay;
pub use balatrobot_transport as transport;

/// The types most programs need.
pub mod prelude {
    pub use crate::Error;
    pub use balatrobot_bot::{Bot, BotConfig, DecisionRequest, RetryPolicy, Strategy, WaitingFor};
    pub use balatrobot_checkpoint::{CheckpointManager, LoadMode};
    pub use balatrobot_client::{BalatroClient, BalatroError, PathTranslator};
    pub use balatrobot_protocol::{
        Action, ActionSchema, Deck, ErrorCode, GameState, Stake, StartRunRequest, State,
    };
    pub use balatrobot_replay::{Recorder, ReplayLog, ReplayOptions, Replayer};
    pub use balatrobot_transport::{TransportConfig, WireContract};
}
