//! Checkpoint storage and restore.
//!
//! A checkpoint is a byte-for-byte copy of the peer's save file, stored as
//! `<dir>/<name>.jkr`. The blob is never parsed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use balatrobot_protocol::GameState;
use tracing::{debug, info};

use crate::timestamp::utc_stamp;
use crate::{CheckpointConfig, CheckpointError, SaveBackend};

/// One stored checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// How [`CheckpointManager::load`] applies a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Overwrite the live save file. Takes effect when the game restarts.
    #[default]
    Restart,
    /// Ask the peer to load the checkpoint immediately.
    Direct,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    /// The checkpoint that was applied.
    pub checkpoint: PathBuf,
    /// Copy of the previous live save, when one existed (restart mode).
    pub backup: Option<PathBuf>,
    /// The peer's state after loading (direct mode).
    pub state: Option<GameState>,
}

/// Saves, lists and restores checkpoints in one directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    config: CheckpointConfig,
}

impl Default for CheckpointManager {
    fn default() -> Self {
        Self::new(CheckpointConfig::default())
    }
}

impl CheckpointManager {
    pub fn new(config: CheckpointConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(CheckpointConfig::in_dir(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn extension(&self) -> &str {
        &self.config.extension
    }

    /// Maps a name or path to a checkpoint file path.
    ///
    /// A bare name resolves inside the checkpoint directory and gets the
    /// extension appended when it has none. Anything with a directory
    /// component is used as given and must already carry the extension.
    /// Nothing on disk is touched.
    pub fn resolve(&self, name_or_path: &str) -> Result<PathBuf, CheckpointError> {
        let trimmed = name_or_path.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            return Err(CheckpointError::InvalidName(name_or_path.to_string()));
        }

        let given = Path::new(trimmed);
        let has_dir = given.is_absolute() || given.components().count() > 1;
        match given.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext == self.config.extension => Ok(if has_dir {
                given.to_path_buf()
            } else {
                self.config.dir.join(given)
            }),
            None if !has_dir => Ok(self
                .config
                .dir
                .join(format!("{trimmed}.{}", self.config.extension))),
            _ => Err(CheckpointError::InvalidExtension {
                path: trimmed.to_string(),
                expected: self.config.extension.clone(),
            }),
        }
    }

    // -- save / load ------------------------------------------------------

    /// Copies the peer's live save into a checkpoint.
    ///
    /// `target` is a name, a path, or `None` for a name from the current
    /// UTC time. An existing checkpoint with the same name is replaced.
    ///
    /// # Errors
    /// - `InvalidExtension` / `InvalidName` before anything else happens.
    /// - `NoActiveSave` when the peer has no save file.
    /// - `SaveFileMissing` when the reported file is not on disk.
    pub async fn save<B: SaveBackend>(
        &self,
        backend: &mut B,
        target: Option<&str>,
    ) -> Result<Checkpoint, CheckpointError> {
        let dest = match target {
            Some(t) => self.resolve(t)?,
            None => self.resolve(&utc_stamp(SystemTime::now()))?,
        };

        let info = backend.save_info().await?;
        let source = match info.save_file_path.as_deref() {
            Some(p) if info.save_exists && !p.is_empty() => PathBuf::from(p),
            _ => return Err(CheckpointError::NoActiveSave),
        };
        if !source.is_file() {
            return Err(CheckpointError::SaveFileMissing(source));
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(CheckpointError::io("create", parent))?;
        }
        fs::copy(&source, &dest).map_err(CheckpointError::io("copy to", &dest))?;
        info!(from = %source.display(), to = %dest.display(), "checkpoint saved");

        self.describe(&dest)
    }

    /// Applies a checkpoint.
    ///
    /// The checkpoint must exist; otherwise nothing is touched. In
    /// [`LoadMode::Restart`] the live save is first copied to
    /// `save.jkr.backup`.
    pub async fn load<B: SaveBackend>(
        &self,
        backend: &mut B,
        name_or_path: &str,
        mode: LoadMode,
    ) -> Result<Loaded, CheckpointError> {
        let checkpoint = self.resolve(name_or_path)?;
        if !checkpoint.is_file() {
            return Err(CheckpointError::NotFound(checkpoint));
        }

        match mode {
            LoadMode::Direct => {
                let path = checkpoint.to_string_lossy().into_owned();
                let state = backend.load_save(&path).await?;
                info!(checkpoint = %path, state = %state.state, "checkpoint loaded in place");
                Ok(Loaded {
                    checkpoint,
                    backup: None,
                    state: Some(state),
                })
            }
            LoadMode::Restart => {
                let info = backend.save_info().await?;
                if info.profile_path.as_deref().is_none_or(str::is_empty) {
                    return Err(CheckpointError::NoActiveProfile);
                }
                let live = match info.save_file_path.as_deref() {
                    Some(p) if !p.is_empty() => PathBuf::from(p),
                    _ => return Err(CheckpointError::NoActiveProfile),
                };

                let backup = if live.is_file() {
                    let mut name = live.clone().into_os_string();
                    name.push(".backup");
                    let backup = PathBuf::from(name);
                    fs::copy(&live, &backup).map_err(CheckpointError::io("back up to", &backup))?;
                    debug!(backup = %backup.display(), "live save backed up");
                    Some(backup)
                } else {
                    None
                };

                if let Some(parent) = live.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(CheckpointError::io("create", parent))?;
                }
                fs::copy(&checkpoint, &live).map_err(CheckpointError::io("copy to", &live))?;
                info!(
                    checkpoint = %checkpoint.display(),
                    save = %live.display(),
                    "checkpoint loaded; restart the game to apply"
                );
                Ok(Loaded {
                    checkpoint,
                    backup,
                    state: None,
                })
            }
        }
    }

    // -- local catalogue --------------------------------------------------

    /// All checkpoints, newest first. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        let dir = &self.config.dir;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CheckpointError::io("read", dir)(e)),
        };

        let mut out = Vec::new();
        for entry in entries {
            let path = entry.map_err(CheckpointError::io("read", dir))?.path();
            if path.is_file() && self.has_extension(&path) {
                out.push(self.describe(&path)?);
            }
        }
        out.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(out)
    }

    /// Looks up one checkpoint.
    pub fn get(&self, name_or_path: &str) -> Result<Checkpoint, CheckpointError> {
        let path = self.existing(name_or_path)?;
        self.describe(&path)
    }

    pub fn delete(&self, name_or_path: &str) -> Result<(), CheckpointError> {
        let path = self.existing(name_or_path)?;
        fs::remove_file(&path).map_err(CheckpointError::io("delete", &path))?;
        info!(path = %path.display(), "checkpoint deleted");
        Ok(())
    }

    /// Copies a checkpoint out to `dest`. A directory destination keeps
    /// the checkpoint's file name.
    pub fn export(&self, name_or_path: &str, dest: &Path) -> Result<PathBuf, CheckpointError> {
        let source = self.existing(name_or_path)?;
        let target = match source.file_name() {
            Some(file) if dest.is_dir() => dest.join(file),
            _ => dest.to_path_buf(),
        };
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(CheckpointError::io("create", parent))?;
        }
        fs::copy(&source, &target).map_err(CheckpointError::io("copy to", &target))?;
        info!(from = %source.display(), to = %target.display(), "checkpoint exported");
        Ok(target)
    }

    /// Copies an external save blob into the checkpoint directory, named
    /// `name` or after the source file.
    pub fn import(
        &self,
        source: &Path,
        name: Option<&str>,
    ) -> Result<Checkpoint, CheckpointError> {
        if !self.has_extension(source) {
            return Err(CheckpointError::InvalidExtension {
                path: source.display().to_string(),
                expected: self.config.extension.clone(),
            });
        }
        if !source.is_file() {
            return Err(CheckpointError::NotFound(source.to_path_buf()));
        }

        let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let name = name.unwrap_or(stem);
        let dest = self.resolve(name)?;
        if dest.parent() != Some(self.config.dir.as_path()) {
            return Err(CheckpointError::InvalidName(name.to_string()));
        }

        fs::create_dir_all(&self.config.dir)
            .map_err(CheckpointError::io("create", &self.config.dir))?;
        fs::copy(source, &dest).map_err(CheckpointError::io("copy to", &dest))?;
        info!(from = %source.display(), to = %dest.display(), "checkpoint imported");
        self.describe(&dest)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.config.extension.as_str())
    }

    fn existing(&self, name_or_path: &str) -> Result<PathBuf, CheckpointError> {
        let path = self.resolve(name_or_path)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(CheckpointError::NotFound(path))
        }
    }

    fn describe(&self, path: &Path) -> Result<Checkpoint, CheckpointError> {
        let meta = fs::metadata(path).map_err(CheckpointError::io("stat", path))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Checkpoint {
            name,
            path: path.to_path_buf(),
            size: meta.len(),
            modified: meta.modified().map_err(CheckpointError::io("stat", path))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> CheckpointManager {
        CheckpointManager::in_dir("/cp")
    }

    #[test]
    fn test_bare_name_gets_extension() {
        assert_eq!(manager().resolve("boss").unwrap(), PathBuf::from("/cp/boss.jkr"));
        assert_eq!(manager().resolve("boss.jkr").unwrap(), PathBuf::from("/cp/boss.jkr"));
    }

    #[test]
    fn test_path_must_carry_extension() {
        assert_eq!(
            manager().resolve("/saves/a.jkr").unwrap(),
            PathBuf::from("/saves/a.jkr")
        );
        let err = manager().resolve("/saves/a").unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidExtension { .. }));
        assert_eq!(err.code(), Some(balatrobot_protocol::ErrorCode::InvalidParameter));
    }

    #[test]
    fn test_wrong_extension_rejected() {
        assert!(matches!(
            manager().resolve("notes.txt"),
            Err(CheckpointError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(manager().resolve("  "), Err(CheckpointError::InvalidName(_))));
    }

    #[test]
    fn test_list_of_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let m = CheckpointManager::in_dir(tmp.path().join("nope"));
        assert!(m.list().unwrap().is_empty());
    }
}
