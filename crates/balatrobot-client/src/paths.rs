//! Translation between the peer's path convention and the local one.
//!
//! The game runs on Windows, or under Proton on Linux. Either way it
//! reports save locations as `C:` paths. On a Linux host the same file
//! lives under the Proton prefix of the game's Steam app id, so the drive
//! letter has to be swapped for that prefix before the path is usable.
//!
//! This is a pure string transform: nothing here touches the filesystem.

/// Location of drive `C:` inside the game's Proton prefix, relative to
/// the home directory.
pub const PROTON_DRIVE_C: &str =
    ".steam/steam/steamapps/compatdata/2379780/pfx/drive_c";

/// Rewrites `C:` paths to a local prefix and back.
///
/// Without a prefix every path passes through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathTranslator {
    local_prefix: Option<String>,
}

impl PathTranslator {
    /// A translator that changes nothing.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Maps drive `C:` onto `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            local_prefix: Some(trimmed.to_string()),
        }
    }

    /// The right translator for this machine: the Proton prefix under
    /// `$HOME` on Linux, identity elsewhere or when `$HOME` is unset.
    pub fn for_host() -> Self {
        if !cfg!(target_os = "linux") {
            return Self::identity();
        }
        match std::env::var("HOME") {
            Ok(home) if !home.is_empty() => Self::with_prefix(format!(
                "{}/{PROTON_DRIVE_C}",
                home.trim_end_matches('/')
            )),
            _ => Self::identity(),
        }
    }

    pub fn local_prefix(&self) -> Option<&str> {
        self.local_prefix.as_deref()
    }

    /// Converts a peer path to a local one.
    ///
    /// Handles `C:/...`, `C:\...` (backslashes become `/`) and bare `C:...`.
    pub fn to_local(&self, remote: &str) -> String {
        let Some(prefix) = &self.local_prefix else {
            return remote.to_string();
        };
        let rest = if let Some(rest) = remote
            .strip_prefix("C:/")
            .or_else(|| remote.strip_prefix("C:\\"))
        {
            rest
        } else if let Some(rest) = remote.strip_prefix("C:") {
            rest
        } else {
            return remote.to_string();
        };
        format!("{prefix}/{}", rest.replace('\\', "/"))
    }

    /// Converts a local path back to the peer's `C:/` form.
    ///
    /// Inverts [`to_local`](Self::to_local) up to separator style: the
    /// result always uses `C:/` and forward slashes.
    pub fn to_remote(&self, local: &str) -> String {
        let Some(prefix) = &self.local_prefix else {
            return local.to_string();
        };
        match local.strip_prefix(prefix.as_str()) {
            Some(rest) if rest.is_empty() => "C:/".to_string(),
            Some(rest) if rest.starts_with('/') => format!("C:{rest}"),
            _ => local.to_string(),
        }
    }
}
