//! Configuration types for story extraction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::shims::DEFAULT_STORIES_KEY;

/// Options for a single extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Forward in-context console output to the caller's logging sink.
    #[serde(default)]
    pub debug: bool,
    /// The global key to poll for story data.
    #[serde(default = "default_stories_key")]
    pub stories_key: String,
    /// Polling configuration.
    #[serde(default)]
    pub poll: PollConfig,
}

fn default_stories_key() -> String {
    DEFAULT_STORIES_KEY.to_string()
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            debug: false,
            stories_key: default_stories_key(),
            poll: PollConfig::default(),
        }
    }
}

impl ExtractOptions {
    /// Creates options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables console forwarding.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the global key to poll.
    #[must_use]
    pub fn with_stories_key(mut self, key: impl Into<String>) -> Self {
        self.stories_key = key.into();
        self
    }

    /// Overrides the polling configuration.
    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }
}

/// Configuration for the story polling loop.
///
/// The defaults allow ~10 seconds for asynchronous host-side work (such as
/// network fetches) to complete before story registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between presence checks in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Maximum number of presence checks before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval_ms() -> u64 {
    100
}

fn default_max_attempts() -> u32 {
    100
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollConfig {
    /// Creates a polling configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval between checks.
    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Sets the maximum number of checks.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Gets the interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_budget() {
        let options = ExtractOptions::default();
        assert!(!options.debug);
        assert_eq!(options.stories_key, DEFAULT_STORIES_KEY);
        assert_eq!(options.poll.interval_ms, 100);
        assert_eq!(options.poll.max_attempts, 100);
    }

    #[test]
    fn test_builders() {
        let options = ExtractOptions::new()
            .with_debug(true)
            .with_stories_key("__STORIES__")
            .with_poll(PollConfig::new().with_interval_ms(10).with_max_attempts(3));

        assert!(options.debug);
        assert_eq!(options.stories_key, "__STORIES__");
        assert_eq!(options.poll.interval(), Duration::from_millis(10));
        assert_eq!(options.poll.max_attempts, 3);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let options: ExtractOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.stories_key, DEFAULT_STORIES_KEY);
        assert_eq!(options.poll.max_attempts, 100);
    }
}
