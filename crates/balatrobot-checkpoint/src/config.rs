//! Where checkpoints live.

use std::path::PathBuf;

use tracing::warn;

/// Checkpoint storage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointConfig {
    /// Directory holding `<name>.<extension>` files. Created on first save.
    pub dir: PathBuf,
    /// Save-file extension, without the dot.
    pub extension: String,
}

impl CheckpointConfig {
    pub const DEFAULT_DIR: &'static str = "checkpoints";
    pub const DEFAULT_EXTENSION: &'static str = "jkr";
    pub const ENV_DIR: &'static str = "BALATROBOT_CHECKPOINT_DIR";

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Reads the directory from `BALATROBOT_CHECKPOINT_DIR`, if set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(Self::ENV_DIR) {
            Some(dir) if !dir.trim().is_empty() => Self::in_dir(dir.trim()),
            _ => Self::default(),
        }
    }

    /// Strips a leading dot from the extension and restores the default
    /// for an empty one.
    pub fn validated(mut self) -> Self {
        let ext = self.extension.trim().trim_start_matches('.');
        if ext.is_empty() {
            warn!(
                default = Self::DEFAULT_EXTENSION,
                "empty checkpoint extension; using default"
            );
            self.extension = Self::DEFAULT_EXTENSION.to_string();
        } else if ext != self.extension {
            self.extension = ext.to_string();
        }
        self
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(Self::DEFAULT_DIR),
            extension: Self::DEFAULT_EXTENSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dir() {
        let c = CheckpointConfig::from_lookup(|_: &str| None);
        assert_eq!(c.dir, PathBuf::from("checkpoints"));
        assert_eq!(c.extension, "jkr");
    }

    #[test]
    fn test_env_dir() {
        let c = CheckpointConfig::from_lookup(|key: &str| {
            (key == CheckpointConfig::ENV_DIR).then(|| "/tmp/cp ".to_string())
        });
        assert_eq!(c.dir, PathBuf::from("/tmp/cp"));
    }

    #[test]
    fn test_extension_normalized() {
        let mut c = CheckpointConfig::default();
        c.extension = ".jkr".into();
        assert_eq!(c.validated().extension, "jkr");

        let mut c = CheckpointConfig::default();
        c.extension = "  ".into();
        assert_eq!(c.validated().extension, "jkr");
    }
}
