// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact names and bodies written to the remote store.

use chrono::{NaiveDate, NaiveDateTime};
use keepsake_core::types::MediaKind;

use crate::clock::{date_stamp, time_stamp};

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A media item referenced from a rich text document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    /// Download link, or the raw locator when no link could be resolved.
    pub reference: String,
}

/// `text_HH-MM-SS.txt`
pub fn text_file_name(at: NaiveDateTime) -> String {
    format!("text_{}.txt", time_stamp(at))
}

/// `text_HH-MM-SS`
pub fn document_title(at: NaiveDateTime) -> String {
    format!("text_{}", time_stamp(at))
}

/// `photo_HH-MM-SS.jpg` or `video_HH-MM-SS.mp4`
pub fn media_file_name(kind: MediaKind, at: NaiveDateTime) -> String {
    format!("{kind}_{}.{}", time_stamp(at), kind.extension())
}

/// `daily_summary_YYYY-MM-DD.txt`
pub fn digest_file_name(date: NaiveDate) -> String {
    format!("daily_summary_{}.txt", date_stamp(date))
}

/// Body of a plain text artifact.
pub fn plain_text_body(text: &str) -> String {
    format!("Forwarded message:\n\n{text}")
}

/// Body of a rich document: the text, the batch's media, and a creation line.
pub fn rich_document_body(text: &str, media: &[MediaRef], created_at: NaiveDateTime) -> String {
    let mut body = text.to_string();
    if !media.is_empty() {
        body.push_str("\n\nRelated media:\n");
        for item in media {
            body.push_str(&format!("• {}: {}\n", item.kind, item.reference));
        }
    }
    body.push_str(&format!(
        "\n\nCreated at: {}",
        created_at.format(CREATED_AT_FORMAT)
    ));
    body
}

/// Plain text digest listing the batch folders saved under a topic on a date.
pub fn digest_report(
    topic: &str,
    date: NaiveDate,
    batches: &[String],
    generated_at: NaiveDateTime,
) -> String {
    let mut report = format!(
        "Daily digest\nGenerated at: {}\nDate: {}\nTopic: {topic}\n\n",
        generated_at.format(CREATED_AT_FORMAT),
        date_stamp(date),
    );
    if batches.is_empty() {
        report.push_str("No forwarded messages were saved on this date.\n");
    } else {
        report.push_str(&format!(
            "{} forwarded message(s) saved:\n",
            batches.len()
        ));
        for (i, name) in batches.iter().enumerate() {
            report.push_str(&format!("{}. {name}\n", i + 1));
        }
    }
    report.push_str("\nAll files are stored in Google Drive.\n");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[test]
    fn artifact_names() {
        assert_eq!(text_file_name(at()), "text_14-05-09.txt");
        assert_eq!(document_title(at()), "text_14-05-09");
        assert_eq!(media_file_name(MediaKind::Photo, at()), "photo_14-05-09.jpg");
        assert_eq!(media_file_name(MediaKind::Video, at()), "video_14-05-09.mp4");
        assert_eq!(
            digest_file_name(at().date()),
            "daily_summary_2026-10-18.txt"
        );
    }

    #[test]
    fn plain_text_has_header() {
        assert_eq!(plain_text_body("hi"), "Forwarded message:\n\nhi");
    }

    #[test]
    fn rich_body_lists_media_then_creation_time() {
        let media = vec![
            MediaRef {
                kind: MediaKind::Photo,
                reference: "https://files/P1".into(),
            },
            MediaRef {
                kind: MediaKind::Video,
                reference: "V1".into(),
            },
        ];
        let body = rich_document_body("hello", &media, at());
        assert_eq!(
            body,
            "hello\n\nRelated media:\n• photo: https://files/P1\n• video: V1\n\n\nCreated at: 2026-10-18 14:05:09"
        );
    }

    #[test]
    fn rich_body_without_media_skips_list() {
        let body = rich_document_body("hello", &[], at());
        assert!(!body.contains("Related media"));
        assert!(body.ends_with("Created at: 2026-10-18 14:05:09"));
    }

    #[test]
    fn digest_report_numbers_batches() {
        let report = digest_report(
            "Diary",
            at().date(),
            &["message_1".into(), "message_9".into()],
            at(),
        );
        assert!(report.contains("Topic: Diary"));
        assert!(report.contains("Date: 2026-10-18"));
        assert!(report.contains("2 forwarded message(s) saved:"));
        assert!(report.contains("1. message_1\n2. message_9\n"));
        assert!(report.ends_with("All files are stored in Google Drive.\n"));
    }

    #[test]
    fn empty_digest_says_so() {
        let report = digest_report("Diary", at().date(), &[], at());
        assert!(report.contains("No forwarded messages"));
    }
}
