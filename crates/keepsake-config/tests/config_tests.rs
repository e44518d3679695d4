// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Keepsake configuration system.

use keepsake_config::diagnostic::{ConfigError, suggest_key};
use keepsake_config::model::KeepsakeConfig;
use keepsake_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_keepsake_config() {
    let toml = r#"
[bot]
name = "moments"
log_level = "debug"

[telegram]
bot_token = "123:ABC"
allowed_users = ["alice", "42"]

[drive]
access_token = "ya29.token"
root_folder_id = "1RootFolder"
rich_documents = false
timeout_secs = 30

[relay]
max_video_bytes = 10485760

[digest]
enabled = true
schedule = "0 1 * * *"
topics = ["Diary"]

[health]
enabled = false
host = "127.0.0.1"
port = 9000
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "moments");
    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.allowed_users, vec!["alice", "42"]);
    assert_eq!(config.drive.access_token.as_deref(), Some("ya29.token"));
    assert_eq!(config.drive.root_folder_id.as_deref(), Some("1RootFolder"));
    assert!(!config.drive.rich_documents);
    assert_eq!(config.drive.timeout_secs, 30);
    assert_eq!(config.relay.max_video_bytes, 10 * 1024 * 1024);
    assert_eq!(config.digest.schedule, "0 1 * * *");
    assert_eq!(config.digest.topics, vec!["Diary"]);
    assert!(!config.health.enabled);
    assert_eq!(config.health.port, 9000);
}

/// Unknown field in [drive] produces an error naming the bad key.
#[test]
fn unknown_field_in_drive_produces_error() {
    let toml = r#"
[drive]
root_folder = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("root_folder"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.bot.name, "keepsake");
    assert_eq!(config.bot.log_level, "info");
    assert!(config.telegram.bot_token.is_none());
    assert!(config.telegram.allowed_users.is_empty());
    assert!(config.drive.access_token.is_none());
    assert!(config.drive.root_folder_id.is_none());
    assert!(config.drive.rich_documents);
    assert_eq!(config.relay.max_video_bytes, 50 * 1024 * 1024);
    assert!(config.digest.enabled);
    assert_eq!(config.health.host, "0.0.0.0");
}

/// A dotted override (the shape the env provider produces) lands in its section.
#[test]
fn dotted_override_sets_drive_root() {
    use figment::{Figment, providers::Serialized};

    let config: KeepsakeConfig = Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(("drive.root_folder_id", "from-env"))
        .extract()
        .expect("should set root_folder_id via dot notation");

    assert_eq!(config.drive.root_folder_id.as_deref(), Some("from-env"));
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: KeepsakeConfig = Figment::new()
        .merge(Serialized::defaults(KeepsakeConfig::default()))
        .merge(Toml::file("/nonexistent/path/keepsake.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.bot.name, "keepsake");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err =
        load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    assert!(format!("{err}").contains("logging"));
}

/// Typos surface as UnknownKey diagnostics with a suggestion.
#[test]
fn typo_yields_unknown_key_with_suggestion() {
    let toml = r#"
[drive]
rich_documnets = true
"#;

    let errors = load_and_validate_str(toml).expect_err("typo should fail");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. }
                if key == "rich_documnets" && s == "rich_documents"
        )
    });
    assert!(found, "expected an UnknownKey suggestion, got: {errors:?}");
}

/// Wrong value types surface as WrongType diagnostics with the dotted key.
#[test]
fn wrong_type_yields_invalid_type() {
    let toml = r#"
[relay]
max_video_bytes = "fifty"
"#;

    let errors = load_and_validate_str(toml).expect_err("wrong type should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::WrongType { key, .. } if key == "relay.max_video_bytes")),
        "expected WrongType, got: {errors:?}"
    );
}

/// Semantic validation runs after successful deserialization.
#[test]
fn validation_errors_are_returned_from_str_loader() {
    let toml = r#"
[digest]
schedule = "whenever"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad cron should fail validation");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("digest.schedule"))
    ));
}

#[test]
fn suggest_key_matches_section_keys() {
    let valid = &["enabled", "schedule", "topics"];
    assert_eq!(suggest_key("shedule", valid), Some("schedule".to_string()));
}

/// Inline TOML errors carry a span pointing at the misspelled key.
#[test]
fn inline_typo_is_labelled_in_its_section() {
    let toml = r#"
[digest]
topics = [
  "Diary",
]
shedule = "5 0 * * *"
"#;

    let errors = load_and_validate_str(toml).expect_err("typo should fail");
    let span = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey { key, span, section, .. } if key == "shedule" => {
                assert_eq!(section.as_deref(), Some("digest"));
                *span
            }
            _ => None,
        })
        .expect("span for shedule");
    assert_eq!(&toml[span.offset()..span.offset() + span.len()], "shedule");
}

/// A misspelled section header is reported as an unknown section.
#[test]
fn unknown_section_names_valid_sections() {
    let errors = load_and_validate_str("[digets]\nenabled = true\n").expect_err("bad section");
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert!(
        rendered.iter().any(|m| m == "unknown section `digets`"),
        "got: {rendered:?}"
    );
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { suggestion: Some(s), .. } if s == "digest"
    )));
}
