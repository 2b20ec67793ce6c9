//! Decision loop for BalatroBot strategies.
//!
//! A bot repeatedly asks the peer what it is waiting for and answers with
//! one [`ActionSchema`](balatrobot_protocol::ActionSchema) chosen by a
//! [`Strategy`]. The loop owns its socket and reconnects after transient
//! drops; protocol violations and strategy mistakes end the run.
//!
//! ```rust,no_run
//! # use balatrobot_bot::{Bot, BotConfig, Strategy};
//! # use balatrobot_transport::TransportConfig;
//! # async fn demo<S: Strategy>(strategy: S) -> Result<(), balatrobot_bot::BotError> {
//! let config = BotConfig::default().seed("EXAMPLE");
//! let mut bot = Bot::new(strategy, config, TransportConfig::default());
//! let summary = bot.run().await?;
//! println!("{} actions", summary.actions);
//! # Ok(())
//! # }
//! ```

mod bot;
mod cache;
mod config;
mod decision;
mod error;
mod strategy;

pub use bot::{random_seed, Bot, RunSummary, StepOutcome};
pub use cache::StateCache;
pub use config::{BotConfig, RetryPolicy};
pub use decision::{DecisionRequest, PeerMessage, WaitingFor};
pub use error::BotError;
pub use strategy::Strategy;
