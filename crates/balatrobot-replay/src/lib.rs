//! Run logs for BalatroBot.
//!
//! A run log is a JSONL file of calls, each with the game state seen just
//! before it was made. [`Recorder`] writes one while a session is played;
//! [`Replayer`] plays it back against a fresh session and checks that the
//! game goes through exactly the same states.
//!
//! ```no_run
//! use balatrobot_client::BalatroClient;
//! use balatrobot_replay::{ReplayLog, ReplayOptions, Replayer};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let log = ReplayLog::from_path("runs/example.jsonl")?;
//! let mut client: BalatroClient = BalatroClient::builder().build();
//! client.connect().await?;
//! let report = Replayer::new(ReplayOptions::default())
//!     .run(&mut client, &log)
//!     .await?;
//! println!("{} steps matched", report.steps);
//! # Ok(())
//! # }
//! ```

mod error;
mod log;
mod recorder;
mod replayer;

pub use error::ReplayError;
pub use log::{latest_run, ReplayLog};
pub use recorder::Recorder;
pub use replayer::{ReplayOptions, ReplayReport, Replayer};
