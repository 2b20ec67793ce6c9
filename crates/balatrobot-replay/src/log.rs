//! JSONL run logs.
//!
//! One [`JsonlLogEntry`] per line, in call order. Blank lines are
//! separators and are skipped. Every entry is validated on load: the call
//! must be a well-formed request and the recorded state must be a valid
//! game state.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use balatrobot_protocol::JsonlLogEntry;
use tracing::debug;

use crate::ReplayError;

/// A recorded session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayLog {
    entries: Vec<JsonlLogEntry>,
}

impl ReplayLog {
    pub fn new(entries: Vec<JsonlLogEntry>) -> Self {
        Self { entries }
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, ReplayError> {
        let mut entries = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: JsonlLogEntry = serde_json::from_str(&line)
                .map_err(|source| ReplayError::Parse { line: line_no, source })?;
            let invalid = |source| ReplayError::InvalidEntry { line: line_no, source };
            entry.function.validate().map_err(invalid)?;
            entry.parsed_state().map_err(invalid)?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let log = Self::from_reader(BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), steps = log.len(), "run log loaded");
        Ok(log)
    }

    /// Writes the log as JSONL, one entry per line.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), ReplayError> {
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry).map_err(std::io::Error::from)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn entries(&self) -> &[JsonlLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: JsonlLogEntry) {
        self.entries.push(entry);
    }
}

/// The most recently modified `.jsonl` file in `dir`.
pub fn latest_run(dir: impl AsRef<Path>) -> Result<PathBuf, ReplayError> {
    let dir = dir.as_ref();
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let modified = fs::metadata(&path)?.modified()?;
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| ReplayError::NoRuns(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = concat!(
        r#"{"timestamp_ms":1,"function":{"name":"go_to_menu","params":{}},"game_state":{"state":5}}"#,
        "\n\n",
        r#"{"timestamp_ms":2,"function":{"name":"start_run","arguments":{"deck":"Red Deck"}},"game_state":{"state":11}}"#,
        "\n",
    );

    #[test]
    fn test_blank_lines_skipped() {
        let log = ReplayLog::from_reader(LOG.as_bytes()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].function.name, "start_run");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = format!("{LOG}not json\n");
        let err = ReplayLog::from_reader(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_invalid_state_rejected() {
        let text = r#"{"timestamp_ms":1,"function":{"name":"x","arguments":{}},"game_state":{"state":0}}"#;
        let err = ReplayLog::from_reader(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidEntry { line: 1, .. }));
    }

    #[test]
    fn test_write_then_read() {
        let log = ReplayLog::from_reader(LOG.as_bytes()).unwrap();
        let mut out = Vec::new();
        log.write_to(&mut out).unwrap();
        assert_eq!(ReplayLog::from_reader(out.as_slice()).unwrap(), log);
    }

    #[test]
    fn test_latest_run_picks_newest() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(latest_run(tmp.path()), Err(ReplayError::NoRuns(_))));

        let old = tmp.path().join("old.jsonl");
        let new = tmp.path().join("new.jsonl");
        fs::write(&old, "").unwrap();
        fs::write(&new, "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(600);
        File::options().write(true).open(&old).unwrap().set_modified(past).unwrap();

        assert_eq!(latest_run(tmp.path()).unwrap(), new);
    }
}
