// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Keepsake.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Videos above this size (50 MiB) are rejected.
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 50 * 1024 * 1024;

/// Top-level Keepsake configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeepsakeConfig {
    /// Bot identity and logging settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Google Drive storage settings.
    #[serde(default)]
    pub drive: DriveConfig,

    /// Aggregation and commit settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Daily digest settings.
    #[serde(default)]
    pub digest: DigestConfig,

    /// Health endpoint settings.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in greetings and logs.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "keepsake".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Falls back to `TELEGRAM_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// List of allowed Telegram user IDs or usernames.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// Google Drive storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DriveConfig {
    /// OAuth access token. Falls back to `GOOGLE_DRIVE_ACCESS_TOKEN`.
    /// Without a token every storage-bound command answers "not configured".
    #[serde(default)]
    pub access_token: Option<String>,

    /// Id of the Drive folder that holds every topic folder.
    /// Falls back to `GOOGLE_DRIVE_FOLDER_ID`.
    #[serde(default)]
    pub root_folder_id: Option<String>,

    /// Store forwarded text as Google Docs documents listing the batch's media.
    /// When false, text is uploaded as plain `.txt` files.
    #[serde(default = "default_rich_documents")]
    pub rich_documents: bool,

    /// Request timeout for Drive and Docs API calls.
    #[serde(default = "default_drive_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            root_folder_id: None,
            rich_documents: default_rich_documents(),
            timeout_secs: default_drive_timeout_secs(),
        }
    }
}

fn default_rich_documents() -> bool {
    true
}

fn default_drive_timeout_secs() -> u64 {
    60
}

/// Aggregation and commit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Largest video accepted, checked against the declared size when
    /// recorded and against the downloaded size when committed.
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_video_bytes: default_max_video_bytes(),
        }
    }
}

fn default_max_video_bytes() -> u64 {
    DEFAULT_MAX_VIDEO_BYTES
}

/// Daily digest configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DigestConfig {
    /// Run the digest on `schedule`.
    #[serde(default = "default_digest_enabled")]
    pub enabled: bool,

    /// Five-field cron expression in local time.
    #[serde(default = "default_digest_schedule")]
    pub schedule: String,

    /// Topics digested on every run, in addition to topics currently
    /// selected by a conversation.
    #[serde(default)]
    pub topics: Vec<String>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled: default_digest_enabled(),
            schedule: default_digest_schedule(),
            topics: Vec::new(),
        }
    }
}

fn default_digest_enabled() -> bool {
    true
}

fn default_digest_schedule() -> String {
    "5 0 * * *".to_string()
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Serve `GET /` and `GET /health`.
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_health_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            host: default_health_host(),
            port: default_health_port(),
        }
    }
}

fn default_health_enabled() -> bool {
    true
}

fn default_health_host() -> String {
    "0.0.0.0".to_string()
}

fn default_health_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = KeepsakeConfig::default();
        assert_eq!(config.bot.name, "keepsake");
        assert_eq!(config.relay.max_video_bytes, 52_428_800);
        assert!(config.drive.rich_documents);
        assert_eq!(config.drive.timeout_secs, 60);
        assert_eq!(config.digest.schedule, "5 0 * * *");
        assert!(config.digest.topics.is_empty());
        assert_eq!(config.health.port, 8080);
        assert!(config.telegram.bot_token.is_none());
    }

    #[test]
    fn digest_topics_deserialize() {
        let toml_str = r#"
[digest]
enabled = false
topics = ["Diary", "Travel"]
"#;
        let config: KeepsakeConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.digest.enabled);
        assert_eq!(config.digest.topics, vec!["Diary", "Travel"]);
        assert_eq!(config.digest.schedule, "5 0 * * *");
    }

    #[test]
    fn drive_denies_unknown_fields() {
        let toml_str = r#"
[drive]
root_folder = "abc"
"#;
        assert!(toml::from_str::<KeepsakeConfig>(toml_str).is_err());
    }
}
