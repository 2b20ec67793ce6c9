//! Wire protocol for BalatroBot.
//!
//! This crate defines the "language" spoken between a bot and the game:
//!
//! - **Types** ([`State`], [`ErrorCode`], [`Deck`], [`Stake`]): the closed
//!   vocabularies the peer reports.
//! - **Models** ([`GameState`], [`ErrorResponse`], typed [`ApiCall`]
//!   requests): validated shapes of every request and reply.
//! - **Actions** ([`Action`], [`ActionSchema`]): what a strategy answers,
//!   in JSON or legacy pipe form.
//! - **Codec** ([`Codec`], [`JsonCodec`]) and [`WireContract`]: how all of
//!   the above becomes bytes.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets. It only decides whether
//! bytes are acceptable and what they mean.
//!
//! ```text
//! Transport (bytes) → Protocol (GameState / ActionSchema) → Client / Bot
//! ```

mod action;
mod codec;
mod error;
mod models;
mod types;
mod wire;

pub use action::{Action, ActionArg, ActionSchema, ArgKind, MAX_HAND_SELECTION};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use models::{
    ApiCall, ApiRequest, ApiResponse, BlindAction, BlindActionRequest, Card, CashOut,
    ErrorResponse, Game, GameState, GetGameState, GetSaveInfo, GoToMenu,
    HandAction, HandActionRequest, JsonObject, JsonlLogEntry, LoadSaveRequest,
    RearrangeConsumablesRequest, SaveInfo, ShopActionRequest, StartRunRequest,
    UseConsumableRequest, SHOP_KEY_PREFIX,
};
pub use types::{Deck, ErrorCategory, ErrorCode, Stake, State};
pub use wire::WireContract;
