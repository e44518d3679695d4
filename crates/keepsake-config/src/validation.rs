// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as parseable cron schedules, non-zero limits, and bind addresses.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::KeepsakeConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KeepsakeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.relay.max_video_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "relay.max_video_bytes must be greater than zero".to_string(),
        });
    }

    if config.drive.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "drive.timeout_secs must be greater than zero".to_string(),
        });
    }

    if let Some(root) = &config.drive.root_folder_id
        && root.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "drive.root_folder_id must not be blank when set".to_string(),
        });
    }

    if let Err(e) = croner::Cron::new(&config.digest.schedule).parse() {
        errors.push(ConfigError::Validation {
            message: format!(
                "digest.schedule `{}` is not a valid cron expression: {e}",
                config.digest.schedule
            ),
        });
    }

    let mut seen_topics = HashSet::new();
    for (i, topic) in config.digest.topics.iter().enumerate() {
        if topic.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("digest.topics[{i}] must not be empty"),
            });
        } else if !seen_topics.insert(topic.trim()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate topic `{topic}` in digest.topics"),
            });
        }
    }

    let host = config.health.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "health.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("health.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
