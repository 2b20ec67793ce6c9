//! RPC client for a running BalatroBot peer.
//!
//! [`BalatroClient`] issues one named call at a time over a single owned
//! connection and turns every failure into a [`BalatroError`] with a
//! stable [`ErrorCode`](balatrobot_protocol::ErrorCode). Raw transport
//! errors never escape this crate.

mod client;
mod error;
mod paths;

pub use client::{BalatroClient, BalatroClientBuilder};
pub use error::{BalatroError, ErrorDetails};
pub use paths::{PathTranslator, PROTON_DRIVE_C};
