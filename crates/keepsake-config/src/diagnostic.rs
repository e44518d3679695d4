// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette reports for config failures.
//!
//! Every section of `keepsake.toml` denies unknown keys and every field has a
//! default, so extraction fails for two reasons in practice: a misspelled key
//! or a value of the wrong type. Both point at the offending line when the
//! file content is available.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Name under which inline TOML (tests, `load_and_validate_str`) is registered.
pub const INLINE_SOURCE: &str = "<inline>";

/// A configuration error ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key or section that Keepsake does not know.
    #[error("unknown {} `{key}`", where_label(.section.as_deref()))]
    #[diagnostic(
        code(keepsake::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `None` for a misspelled section header.
        section: Option<String>,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a keepsake setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that does not deserialize into the field's type.
    #[error("`{key}` expects {expected}, found {found}")]
    #[diagnostic(code(keepsake::config::wrong_type), help("{}", value_hint(key)))]
    WrongType {
        /// Dotted path, e.g. `relay.max_video_bytes`.
        key: String,
        found: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A semantic check in [`crate::validation`] failed.
    #[error("validation error: {message}")]
    #[diagnostic(code(keepsake::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(keepsake::config::other))]
    Other(String),
}

fn where_label(section: Option<&str>) -> String {
    match section {
        Some(section) => format!("key in [{section}]"),
        None => "section".to_string(),
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid names here: {valid_keys}"),
        None => format!("valid names here: {valid_keys}"),
    }
}

/// Example value for the fields whose type is most often gotten wrong.
fn value_hint(key: &str) -> &'static str {
    match key {
        "relay.max_video_bytes" => "use a plain byte count, e.g. `max_video_bytes = 52428800`",
        "drive.timeout_secs" => "use whole seconds, e.g. `timeout_secs = 30`",
        "health.port" => "use a port number, e.g. `port = 8080`",
        "digest.topics" | "telegram.allowed_users" => {
            "use a list of strings, e.g. `topics = [\"Diary\", \"Travel\"]`"
        }
        "digest.enabled" | "health.enabled" | "drive.rich_documents" => "use `true` or `false`",
        _ => "strings must be quoted, numbers and booleans must not",
    }
}

/// Converts a `figment::Error` (which may hold several failures) into reports.
///
/// `toml_sources` pairs a source name with its content. File sources are
/// matched by absolute path, inline strings by [`INLINE_SOURCE`].
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            // The path ends with the offending key itself: `["digest", "shedule"]`.
            let path: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            let section = match path.as_slice() {
                [section, _, ..] => Some(section.clone()),
                _ => None,
            };
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, toml_sources, section.as_deref(), field);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        section,
                        span,
                        src,
                    }
                }
                Kind::InvalidType(found, expected) => {
                    let field = path.get(1).or(path.first()).map_or("", String::as_str);
                    let (span, src) = locate(&error, toml_sources, section.as_deref(), field);
                    ConfigError::WrongType {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Finds the TOML text the error came from and the span of `key` in it.
fn locate(
    error: &figment::Error,
    toml_sources: &[(String, String)],
    section: Option<&str>,
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(metadata) = error.metadata.as_ref() else {
        return (None, None);
    };
    let name = match &metadata.source {
        Some(figment::Source::File(path)) => path.display().to_string(),
        // `Toml::string` carries no source, only a name.
        None if metadata.name.ends_with("source string") => INLINE_SOURCE.to_string(),
        _ => return (None, None),
    };

    toml_sources
        .iter()
        .find(|(n, _)| *n == name)
        .and_then(|(n, content)| {
            let offset = find_key_offset(content, section, key)?;
            Some((
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(n, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `key` inside `[section]`, or of a `[key]` header when
/// `section` is `None`.
///
/// Tracks the current table while scanning so a key is only matched in its
/// own section, and skips the body of multi-line arrays such as
/// `digest.topics`.
pub fn find_key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut array_depth = 0i32;
    let mut line_start = 0;

    for line in content.split_inclusive('\n') {
        let offset = line_start;
        line_start += line.len();

        let body = strip_comment(line);
        let trimmed = body.trim_start();
        let indent = body.len() - trimmed.len();

        if array_depth > 0 {
            array_depth += bracket_balance(trimmed);
            continue;
        }
        if trimmed.trim().is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header.trim_end().trim_end_matches(']').trim();
            if section.is_none() && name == key {
                let name_at = header.find(name).unwrap_or(0);
                return Some(offset + indent + 1 + name_at);
            }
            current = Some(name);
            continue;
        }

        let Some((lhs, rhs)) = trimmed.split_once('=') else {
            continue;
        };
        let name = lhs.trim().trim_matches('"');
        if current == section && name == key {
            let name_at = lhs.find(name).unwrap_or(0);
            return Some(offset + indent + name_at);
        }
        array_depth = bracket_balance(rhs).max(0);
    }

    None
}

/// Drops a trailing `#` comment, ignoring `#` inside quoted strings.
fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '#') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Open minus close brackets outside quoted strings.
fn bracket_balance(text: &str) -> i32 {
    let mut quote = None;
    let mut balance = 0;
    for c in text.chars() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '[') => balance += 1,
            (None, ']') => balance -= 1,
            _ => {}
        }
    }
    balance
}

/// Best Jaro-Winkler match above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders reports to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[bot]
name = "keepsake"

[digest]
# topics are folder names
topics = [
  "Diary",
  "schedule = 1",
]
shedule = "5 0 * * *"

[relay]
shedule = "x"
"#;

    #[test]
    fn suggests_close_names() {
        assert_eq!(
            suggest_key("rich_documnets", &["access_token", "rich_documents", "timeout_secs"]),
            Some("rich_documents".to_string())
        );
        assert_eq!(suggest_key("zzzzzz", &["max_video_bytes"]), None);
    }

    #[test]
    fn finds_key_after_multiline_array() {
        let offset = find_key_offset(SAMPLE, Some("digest"), "shedule").unwrap();
        assert!(SAMPLE[offset..].starts_with("shedule = \"5 0"));
    }

    #[test]
    fn matches_only_within_own_section() {
        let offset = find_key_offset(SAMPLE, Some("relay"), "shedule").unwrap();
        assert!(SAMPLE[offset..].starts_with("shedule = \"x\""));
        assert!(find_key_offset(SAMPLE, Some("bot"), "shedule").is_none());
        assert!(find_key_offset(SAMPLE, Some("health"), "port").is_none());
    }

    #[test]
    fn array_key_itself_is_found() {
        let offset = find_key_offset(SAMPLE, Some("digest"), "topics").unwrap();
        assert!(SAMPLE[offset..].starts_with("topics = ["));
    }

    #[test]
    fn unknown_section_header_is_found() {
        let content = "[bot]\nname = \"x\"\n\n[ logging ]\nlevel = 1\n";
        let offset = find_key_offset(content, None, "logging").unwrap();
        assert_eq!(&content[offset..offset + 7], "logging");
    }

    #[test]
    fn comments_do_not_match() {
        let content = "[drive]\n# root_folder_id = \"old\"\nroot_folder_id = \"new\"\n";
        let offset = find_key_offset(content, Some("drive"), "root_folder_id").unwrap();
        assert!(content[offset..].starts_with("root_folder_id = \"new\""));
    }

    #[test]
    fn hints_name_keepsake_fields() {
        assert!(value_hint("relay.max_video_bytes").contains("52428800"));
        assert!(value_hint("digest.topics").contains("Diary"));
        assert!(value_hint("bot.name").contains("quoted"));
    }
}
