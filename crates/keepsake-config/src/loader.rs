// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keepsake.toml` > `~/.config/keepsake/keepsake.toml` > `/etc/keepsake/keepsake.toml`
//! with environment variable overrides via `KEEPSAKE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KeepsakeConfig;

const SYSTEM_CONFIG_PATH: &str = "/etc/keepsake/keepsake.toml";
const LOCAL_CONFIG_PATH: &str = "keepsake.toml";

/// Path of the per-user config file, if the platform has a config directory.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keepsake/keepsake.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keepsake/keepsake.toml` (system-wide)
/// 3. `~/.config/keepsake/keepsake.toml` (user XDG config)
/// 4. `./keepsake.toml` (local directory)
/// 5. `KEEPSAKE_*` environment variables
pub fn load_config() -> Result<KeepsakeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeepsakeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Sections that `KEEPSAKE_<SECTION>_<KEY>` variables may address.
const ENV_SECTIONS: &[&str] = &["bot", "telegram", "drive", "relay", "digest", "health"];

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `KEEPSAKE_DRIVE_ROOT_FOLDER_ID` must map to
/// `drive.root_folder_id`, not `drive.root.folder.id`. Only the leading
/// section name is rewritten, so `KEEPSAKE_TELEGRAM_BOT_TOKEN` stays
/// `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("KEEPSAKE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env key to a dotted config path.
///
/// Figment hands over the key with its original case, so matching is done on
/// the lowercased form.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| format!("{section}.{rest}"))
        })
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[relay]
max_video_bytes = 1024
"#,
        )
        .unwrap();
        assert_eq!(config.relay.max_video_bytes, 1024);
        assert_eq!(config.bot.name, "keepsake");
    }

    #[test]
    fn env_key_mapping_only_rewrites_leading_section() {
        assert_eq!(map_env_key("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(map_env_key("bot_log_level"), "bot.log_level");
        assert_eq!(map_env_key("drive_root_folder_id"), "drive.root_folder_id");
        assert_eq!(map_env_key("unknown"), "unknown");
    }

    #[test]
    fn env_key_mapping_ignores_case() {
        assert_eq!(map_env_key("DRIVE_ROOT_FOLDER_ID"), "drive.root_folder_id");
        assert_eq!(map_env_key("Telegram_Bot_Token"), "telegram.bot_token");
        assert_eq!(map_env_key("DIGEST_ENABLED"), "digest.enabled");
    }

    #[test]
    fn env_keys_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEEPSAKE_DRIVE_ROOT_FOLDER_ID", "root-123");
            jail.set_env("KEEPSAKE_TELEGRAM_BOT_TOKEN", "42:abc");
            jail.set_env("KEEPSAKE_HEALTH_PORT", "9090");
            let config = build_figment().extract::<KeepsakeConfig>()?;
            assert_eq!(config.drive.root_folder_id.as_deref(), Some("root-123"));
            assert_eq!(config.telegram.bot_token.as_deref(), Some("42:abc"));
            assert_eq!(config.health.port, 9090);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_apply_on_top_of_explicit_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[relay]\nmax_video_bytes = 2048\n")?;
            jail.set_env("KEEPSAKE_RELAY_MAX_VIDEO_BYTES", "4096");
            jail.set_env("KEEPSAKE_BOT_LOG_LEVEL", "debug");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.relay.max_video_bytes, 4096);
            assert_eq!(config.bot.log_level, "debug");
            Ok(())
        });
    }
}
