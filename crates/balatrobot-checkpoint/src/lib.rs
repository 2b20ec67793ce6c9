//! Session checkpoints for BalatroBot.
//!
//! A checkpoint is a copy of the game's `save.jkr` taken through the peer's
//! `get_save_info` call. Checkpoints can be listed, exported, imported and
//! deleted locally, and restored either by overwriting the live save
//! (applies on the next game restart) or by asking the peer to load it
//! immediately.
//!
//! Save paths reported by the peer are translated to the local convention
//! by the client's [`PathTranslator`] before they are used here.

#![allow(async_fn_in_trait)]

mod backend;
mod config;
mod error;
mod manager;
mod timestamp;

pub use backend::SaveBackend;
pub use balatrobot_client::PathTranslator;
pub use config::CheckpointConfig;
pub use error::CheckpointError;
pub use manager::{Checkpoint, CheckpointManager, LoadMode, Loaded};
pub use timestamp::utc_stamp;
