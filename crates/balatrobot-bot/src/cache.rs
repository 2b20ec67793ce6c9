//! On-disk log of decision requests, one file per decision.
//!
//! Layout: `<dir>/<waitingFor>/<micros-since-epoch>-<seq>.json`. The
//! sequence number keeps names unique when two decisions land in the same
//! microsecond.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::DecisionRequest;

#[derive(Debug)]
pub struct StateCache {
    dir: PathBuf,
    seq: u64,
}

impl StateCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `req` as pretty JSON and returns the file's path.
    pub fn write(&mut self, req: &DecisionRequest) -> io::Result<PathBuf> {
        let bucket = self.dir.join(req.waiting_for.as_str());
        fs::create_dir_all(&bucket)?;

        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_micros());
        let path = bucket.join(format!("{micros:020}-{:06}.json", self.seq));
        self.seq += 1;

        let body = serde_json::to_vec_pretty(&req.raw)?;
        fs::write(&path, body)?;
        debug!(path = %path.display(), "cached decision request");
        Ok(path)
    }
}
