//! Bot run settings.

use std::path::PathBuf;
use std::time::Duration;

use balatrobot_protocol::{Deck, Stake};
use tracing::warn;

/// How the loop reacts to socket failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before the run is abandoned.
    /// A successful receive resets the count.
    pub max_consecutive: u32,
    /// Pause before each reconnect attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive: 10,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first socket error.
    pub fn never() -> Self {
        Self {
            max_consecutive: 0,
            backoff: Duration::ZERO,
        }
    }
}

/// Settings for one bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub deck: Deck,
    pub stake: Stake,
    /// Run seed. `None` draws a fresh one per run with
    /// [`random_seed`](crate::random_seed).
    pub seed: Option<String>,
    pub challenge: Option<String>,
    /// When set, every decision request is written under this directory.
    pub state_cache_dir: Option<PathBuf>,
    pub retry: RetryPolicy,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            deck: Deck::Red,
            stake: Stake::White,
            seed: None,
            challenge: None,
            state_cache_dir: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl BotConfig {
    pub fn new(deck: Deck, stake: Stake) -> Self {
        Self {
            deck,
            stake,
            ..Default::default()
        }
    }

    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }

    pub fn state_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_cache_dir = Some(dir.into());
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Normalizes values that would break a run.
    ///
    /// A blank seed or challenge is treated as absent, and a seed with
    /// `|` (unrepresentable in the datagram action form) is dropped.
    pub fn validated(mut self) -> Self {
        if self.seed.as_deref().is_some_and(|s| s.trim().is_empty()) {
            self.seed = None;
        }
        if let Some(seed) = self.seed.as_deref().filter(|s| s.contains('|')) {
            warn!(seed, "seed contains '|'; a random seed will be used");
            self.seed = None;
        }
        if self.challenge.as_deref().is_some_and(|c| c.trim().is_empty()) {
            self.challenge = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = BotConfig::default();
        assert_eq!(c.deck, Deck::Red);
        assert_eq!(c.stake, Stake::White);
        assert!(c.seed.is_none());
        assert_eq!(c.retry.max_consecutive, 10);
    }

    #[test]
    fn test_blank_seed_becomes_random() {
        let c = BotConfig::default().seed("  ").validated();
        assert!(c.seed.is_none());
    }

    #[test]
    fn test_pipe_in_seed_rejected() {
        let c = BotConfig::default().seed("A|B").validated();
        assert!(c.seed.is_none());
    }

    #[test]
    fn test_valid_values_survive() {
        let c = BotConfig::new(Deck::Plasma, Stake::Gold)
            .seed("EXAMPLE")
            .challenge("Jokerless")
            .validated();
        assert_eq!(c.seed.as_deref(), Some("EXAMPLE"));
        assert_eq!(c.challenge.as_deref(), Some("Jokerless"));
        assert_eq!(c.deck, Deck::Plasma);
    }
}
