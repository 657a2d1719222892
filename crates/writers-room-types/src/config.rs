//! Run configuration for the Writers' Room.
//!
//! `RoomConfig` represents `writers_room.toml`. Every field has a default so
//! an empty or missing file is a valid configuration. The value is passed
//! explicitly into directors and agents; nothing reads it from globals.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialog::DEFAULT_CHANNEL;
use crate::llm::ProviderConfig;

/// Which broker carries the dialog channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// In-process broadcast channels.
    Memory,
    /// Redis pub/sub.
    Redis,
}

impl fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerKind::Memory => write!(f, "memory"),
            BrokerKind::Redis => write!(f, "redis"),
        }
    }
}

impl FromStr for BrokerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BrokerKind::Memory),
            "redis" => Ok(BrokerKind::Redis),
            other => Err(format!("invalid broker: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Dialog channel name shared by every scene of a run.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Line ceiling per scene.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Directory for default transcript paths.
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: PathBuf,

    /// Seconds without a new line before a scene is considered finished.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Chance an agent speaks when neither mention nor recency applies.
    #[serde(default = "default_interjection_probability")]
    pub interjection_probability: f64,

    /// How many recent lines go into each generation prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Extra attempts after a failed generation before a turn is skipped.
    #[serde(default = "default_generation_retries")]
    pub generation_retries: u32,

    /// Backoff before the first retry; doubles on each further retry.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Consecutive skipped turns that end a scene with an error.
    #[serde(default = "default_max_generation_failures")]
    pub max_generation_failures: u32,

    #[serde(default = "default_broker")]
    pub broker: BrokerKind,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default)]
    pub provider: ProviderConfig,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_max_lines() -> usize {
    50
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from("transcripts")
}

fn default_idle_timeout_secs() -> u64 {
    120
}

fn default_interjection_probability() -> f64 {
    0.10
}

fn default_history_window() -> usize {
    10
}

fn default_generation_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_generation_failures() -> u32 {
    3
}

fn default_broker() -> BrokerKind {
    BrokerKind::Memory
}

fn default_redis_url() -> String {
    "redis://127.0.0.1/".to_string()
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            max_lines: default_max_lines(),
            transcript_dir: default_transcript_dir(),
            idle_timeout_secs: default_idle_timeout_secs(),
            interjection_probability: default_interjection_probability(),
            history_window: default_history_window(),
            generation_retries: default_generation_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_generation_failures: default_max_generation_failures(),
            broker: default_broker(),
            redis_url: default_redis_url(),
            provider: ProviderConfig::default(),
        }
    }
}

impl RoomConfig {
    /// Reject values no scene can run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_lines == 0 {
            return Err("max_lines must be a positive integer".to_string());
        }
        if self.channel.trim().is_empty() {
            return Err("channel name must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.interjection_probability) {
            return Err(format!(
                "interjection_probability must be within 0..=1, got {}",
                self.interjection_probability
            ));
        }
        if self.idle_timeout_secs == 0 {
            return Err("idle_timeout_secs must be positive".to_string());
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default_values() {
        let config = RoomConfig::default();
        assert_eq!(config.channel, "writers_room:dialog");
        assert_eq!(config.max_lines, 50);
        assert_eq!(config.history_window, 10);
        assert!((config.interjection_probability - 0.10).abs() < f64::EPSILON);
        assert_eq!(config.broker, BrokerKind::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_room_config_deserialize_empty() {
        let config: RoomConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_lines, 50);
        assert_eq!(config.transcript_dir, PathBuf::from("transcripts"));
    }

    #[test]
    fn test_room_config_deserialize_with_values() {
        let toml_str = r#"
channel = "room:test"
max_lines = 12
broker = "redis"
redis_url = "redis://cache:6379/"

[provider]
provider_type = "openai_compatible"
name = "mistral"
model = "mistral-large-latest"
api_key_env = "MISTRAL_API_KEY"
"#;
        let config: RoomConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.channel, "room:test");
        assert_eq!(config.max_lines, 12);
        assert_eq!(config.broker, BrokerKind::Redis);
        assert_eq!(config.provider.name.as_deref(), Some("mistral"));
        assert_eq!(config.provider.api_key_env, "MISTRAL_API_KEY");
        // Untouched provider fields keep their defaults
        assert_eq!(config.provider.max_tokens, 300);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = RoomConfig {
            max_lines: 0,
            ..RoomConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("max_lines"));

        let config = RoomConfig {
            channel: "  ".to_string(),
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RoomConfig {
            interjection_probability: 1.5,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_broker_kind_roundtrip() {
        for kind in [BrokerKind::Memory, BrokerKind::Redis] {
            assert_eq!(kind.to_string().parse::<BrokerKind>().unwrap(), kind);
        }
    }
}
