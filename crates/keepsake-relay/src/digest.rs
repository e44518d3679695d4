// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily digest: a plain text report of the batches saved under one topic
//! on one date.
//!
//! The date is always explicit. Running twice for the same date uploads a
//! second report next to the first.

use std::sync::Arc;

use chrono::NaiveDate;
use keepsake_core::error::KeepsakeError;
use keepsake_core::types::{BlobUpload, RemoteArtifact};
use tracing::info;

use crate::clock::Clock;
use crate::document;
use crate::resolver::FolderResolver;

/// Result of one digest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestOutcome {
    pub artifact: RemoteArtifact,
    /// Names of the batch folders found under the date folder.
    pub batches: Vec<String>,
}

/// Summarizes a topic's date folder into a report uploaded beside its batches.
pub struct DigestJob {
    resolver: Arc<FolderResolver>,
    clock: Arc<dyn Clock>,
}

impl DigestJob {
    pub fn new(resolver: Arc<FolderResolver>, clock: Arc<dyn Clock>) -> Self {
        Self { resolver, clock }
    }

    /// Runs the digest for `topic` on `date`.
    pub async fn run(&self, topic: &str, date: NaiveDate) -> Result<DigestOutcome, KeepsakeError> {
        let date_folder = self.resolver.resolve_date(topic, date).await?;
        let backend = self.resolver.backend();

        let batches: Vec<String> = backend
            .list_children(&date_folder)
            .await?
            .into_iter()
            .filter(|entry| entry.is_container)
            .map(|entry| entry.name)
            .collect();

        let report = document::digest_report(topic, date, &batches, self.clock.now());
        let artifact = backend
            .upload_blob(BlobUpload {
                parent: date_folder,
                name: document::digest_file_name(date),
                bytes: report.into_bytes(),
                mime_type: "text/plain".to_string(),
                description: None,
            })
            .await?;

        info!(
            topic,
            date = %date,
            batches = batches.len(),
            artifact = artifact.display_ref(),
            "digest uploaded"
        );
        Ok(DigestOutcome { artifact, batches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use keepsake_core::types::{BlobUpload, CorrelationId};
    use keepsake_core::StorageBackend;
    use keepsake_test_utils::MockDrive;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn job(drive: &Arc<MockDrive>) -> (DigestJob, Arc<FolderResolver>) {
        let resolver = Arc::new(FolderResolver::new(drive.clone(), drive.root()));
        let clock = FixedClock(
            NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(0, 5, 0)
                .unwrap(),
        );
        (DigestJob::new(resolver.clone(), Arc::new(clock)), resolver)
    }

    #[tokio::test]
    async fn lists_only_batch_containers() {
        let drive = Arc::new(MockDrive::new());
        let (job, resolver) = job(&drive);
        for id in ["1", "2"] {
            resolver
                .resolve("Diary", date(), &CorrelationId(id.into()))
                .await
                .unwrap();
        }
        let date_folder = resolver.resolve_date("Diary", date()).await.unwrap();
        drive
            .upload_blob(BlobUpload {
                parent: date_folder.clone(),
                name: "stray.txt".into(),
                bytes: b"x".to_vec(),
                mime_type: "text/plain".into(),
                description: None,
            })
            .await
            .unwrap();

        let outcome = job.run("Diary", date()).await.unwrap();
        assert_eq!(outcome.batches, vec!["message_1", "message_2"]);

        let report = drive.blob_named("daily_summary_2026-10-17.txt").await.unwrap();
        assert_eq!(report.parent, date_folder.0);
        let text = report.text();
        assert!(text.contains("2 forwarded message(s) saved:"));
        assert!(text.contains("Generated at: 2026-10-18 00:05:00"));
    }

    #[tokio::test]
    async fn rerun_adds_a_second_report() {
        let drive = Arc::new(MockDrive::new());
        let (job, _) = job(&drive);
        job.run("Diary", date()).await.unwrap();
        job.run("Diary", date()).await.unwrap();
        let reports = drive
            .blobs()
            .await
            .into_iter()
            .filter(|b| b.name == "daily_summary_2026-10-17.txt")
            .count();
        assert_eq!(reports, 2);
    }

    #[tokio::test]
    async fn listing_failure_is_returned() {
        let drive = Arc::new(MockDrive::new());
        let (job, _) = job(&drive);
        drive.set_unavailable(true).await;
        let err = job.run("Diary", date()).await.unwrap_err();
        assert!(matches!(err, KeepsakeError::BackendUnavailable { .. }));
    }
}
