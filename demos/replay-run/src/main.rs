//! Replays a recorded run and checks the game reaches the same states.
//!
//! ```text
//! replay-run [FILE.jsonl] [DELAY_SECS]
//! ```
//!
//! Without a file, the newest `.jsonl` in `runs/` is used.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use balatrobot::prelude::*;
use balatrobot::replay::latest_run;

const RUNS_DIR: &str = "runs";

async fn replay(file: Option<PathBuf>, delay: Duration) -> Result<(), Error> {
    let path = match file {
        Some(path) => path,
        None => latest_run(RUNS_DIR)?,
    };
    let log = ReplayLog::from_path(&path)?;
    tracing::info!(path = %path.display(), steps = log.len(), "replaying");

    let mut client: BalatroClient = BalatroClient::new(TransportConfig::from_env()?.validated());
    client.connect().await?;
    let report = Replayer::new(ReplayOptions::default().with_delay(delay))
        .run(&mut client, &log)
        .await;
    client.disconnect().await;

    let report = report?;
    tracing::info!(
        steps = report.steps,
        final_state = ?report.final_state.map(|s| s.state),
        "replay matched"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    balatrobot::init_tracing();

    let mut args = std::env::args().skip(1);
    let file = args.next().map(PathBuf::from);
    let delay = match args.next().map(|s| s.parse::<f64>()) {
        None => Duration::ZERO,
        Some(Ok(secs)) if secs.is_finite() && secs >= 0.0 => Duration::from_secs_f64(secs),
        Some(_) => {
            eprintln!("usage: replay-run [FILE.jsonl] [DELAY_SECS]");
            return ExitCode::from(2);
        }
    };

    match replay(file, delay).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(code) = e.code() {
                eprintln!("code: {code}");
            }
            for (key, value) in &e.context() {
                eprintln!("  {key}: {value}");
            }
            ExitCode::FAILURE
        }
    }
}
