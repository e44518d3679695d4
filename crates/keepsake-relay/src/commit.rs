// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Commit pipeline: drains a conversation's batch and uploads every item.
//!
//! Draining is the commit point. Once the batch is drained it is gone, even
//! if every upload then fails; retrying means forwarding again. Each item is
//! attempted independently and a failure becomes one line in the report.

use std::sync::Arc;

use chrono::NaiveDate;
use keepsake_core::TransportAdapter;
use keepsake_core::error::KeepsakeError;
use keepsake_core::types::{
    BlobUpload, ConversationKey, CorrelationId, MediaKind, MediaLocator, RemoteArtifact,
};
use tracing::{debug, info, warn};

use crate::aggregator::PendingAggregator;
use crate::clock::{Clock, date_stamp};
use crate::document::{self, MediaRef};
use crate::notify::notify_quietly;
use crate::recording;
use crate::resolver::FolderResolver;
use crate::session::PendingBatch;

/// Upload behavior for committed items.
#[derive(Debug, Clone, Copy)]
pub struct CommitSettings {
    /// Store text as rich documents listing the batch's media.
    pub rich_documents: bool,
    /// Ceiling re-checked against the downloaded size of each video.
    pub max_video_bytes: u64,
}

/// Whether a commit found anything to upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// No batch existed; nothing was attempted.
    NothingPending,
    /// A batch was drained and every item was attempted.
    Attempted,
}

/// Outcome of one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub status: CommitStatus,
    pub succeeded: usize,
    /// One human-readable line per failed item.
    pub errors: Vec<String>,
    pub folder_name: String,
    pub date_stamp: String,
}

impl CommitReport {
    pub fn nothing_pending(folder_name: impl Into<String>, date_stamp: impl Into<String>) -> Self {
        Self {
            status: CommitStatus::NothingPending,
            succeeded: 0,
            errors: Vec::new(),
            folder_name: folder_name.into(),
            date_stamp: date_stamp.into(),
        }
    }

    fn attempted(folder_name: &str, date_stamp: String) -> Self {
        Self {
            status: CommitStatus::Attempted,
            succeeded: 0,
            errors: Vec::new(),
            folder_name: folder_name.to_string(),
            date_stamp,
        }
    }

    pub fn is_nothing_pending(&self) -> bool {
        self.status == CommitStatus::NothingPending
    }

    fn record(&mut self, label: String, result: Result<RemoteArtifact, KeepsakeError>) {
        match result {
            Ok(artifact) => {
                debug!(item = label.as_str(), artifact = artifact.display_ref(), "item saved");
                self.succeeded += 1;
            }
            Err(e) => {
                warn!(item = label.as_str(), error = %e, "item upload failed");
                self.errors.push(format!("{label}: {e}"));
            }
        }
    }

    /// The summary sent back to the conversation.
    pub fn render(&self) -> String {
        if self.is_nothing_pending() {
            return "Nothing to save yet. Forward some text, photos or videos first, then send /save."
                .to_string();
        }
        let mut text = format!(
            "Saved {} item(s) to {}/{}.",
            self.succeeded, self.folder_name, self.date_stamp
        );
        if !self.errors.is_empty() {
            text.push_str(&format!("\n{} item(s) failed:", self.errors.len()));
            for error in &self.errors {
                text.push_str("\n- ");
                text.push_str(error);
            }
        }
        text
    }
}

/// A drained batch waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct CommitTask {
    pub key: ConversationKey,
    pub folder: String,
    pub batch: PendingBatch,
}

/// Drains batches and uploads their items through the folder resolver.
pub struct CommitPipeline {
    aggregator: Arc<PendingAggregator>,
    resolver: Arc<FolderResolver>,
    transport: Arc<dyn TransportAdapter + Send + Sync>,
    clock: Arc<dyn Clock>,
    settings: CommitSettings,
}

impl CommitPipeline {
    pub fn new(
        aggregator: Arc<PendingAggregator>,
        resolver: Arc<FolderResolver>,
        transport: Arc<dyn TransportAdapter + Send + Sync>,
        clock: Arc<dyn Clock>,
        settings: CommitSettings,
    ) -> Self {
        Self {
            aggregator,
            resolver,
            transport,
            clock,
            settings,
        }
    }

    /// Commits the batch for `key` into `folder` and notifies the
    /// conversation with the summary.
    pub async fn commit(&self, key: &ConversationKey, folder: &str) -> CommitReport {
        match self.begin(key, folder).await {
            Some(task) => self.finish(task).await,
            None => self.report_nothing_pending(key, folder).await,
        }
    }

    /// Announces the commit, then drains the batch for `key`. Returns `None`
    /// when nothing is pending.
    pub async fn begin(&self, key: &ConversationKey, folder: &str) -> Option<CommitTask> {
        if !self.aggregator.has_pending(key) {
            return None;
        }
        let (texts, photos, videos) = self.aggregator.pending_counts(key);
        notify_quietly(
            self.transport.as_ref(),
            key,
            format!("Saving {} item(s) to {folder}...", texts + photos + videos),
        )
        .await;

        let batch = self.aggregator.drain(key).filter(|b| !b.is_empty())?;
        Some(CommitTask {
            key: key.clone(),
            folder: folder.to_string(),
            batch,
        })
    }

    /// Tells the conversation there was nothing to commit.
    pub async fn report_nothing_pending(&self, key: &ConversationKey, folder: &str) -> CommitReport {
        let report = CommitReport::nothing_pending(folder, date_stamp(self.clock.today()));
        notify_quietly(self.transport.as_ref(), key, report.render()).await;
        report
    }

    /// Uploads every item of a drained batch and sends the summary.
    pub async fn finish(&self, task: CommitTask) -> CommitReport {
        let CommitTask { key, folder, batch } = task;
        let date = self.clock.today();

        info!(
            chat_id = %key,
            folder = folder.as_str(),
            correlation_id = %batch.correlation,
            items = batch.item_count(),
            "committing batch"
        );

        let mut report = CommitReport::attempted(&folder, date_stamp(date));

        let media = if self.settings.rich_documents && !batch.texts.is_empty() {
            self.media_refs(&batch).await
        } else {
            Vec::new()
        };

        for (i, text) in batch.texts.iter().enumerate() {
            let result = self
                .store_text(&folder, date, &batch.correlation, text, &media)
                .await;
            report.record(format!("text {}", i + 1), result);
        }
        for (i, photo) in batch.photos.iter().enumerate() {
            let result = self
                .store_media(
                    MediaKind::Photo,
                    &folder,
                    date,
                    &batch.correlation,
                    &photo.locator,
                    photo.caption.clone(),
                )
                .await;
            report.record(format!("photo {}", i + 1), result);
        }
        for (i, video) in batch.videos.iter().enumerate() {
            let result = self
                .store_media(
                    MediaKind::Video,
                    &folder,
                    date,
                    &batch.correlation,
                    &video.locator,
                    video.caption.clone(),
                )
                .await;
            report.record(format!("video {}", i + 1), result);
        }

        recording::record_commit(report.succeeded, report.errors.len());
        info!(
            chat_id = %key,
            succeeded = report.succeeded,
            failed = report.errors.len(),
            "commit finished"
        );
        notify_quietly(self.transport.as_ref(), &key, report.render()).await;
        report
    }

    /// Links for every photo and video in the batch, photos first. A locator
    /// that cannot be resolved is listed as-is.
    async fn media_refs(&self, batch: &PendingBatch) -> Vec<MediaRef> {
        let items = batch
            .photos
            .iter()
            .map(|p| (MediaKind::Photo, &p.locator))
            .chain(batch.videos.iter().map(|v| (MediaKind::Video, &v.locator)));

        let mut refs = Vec::new();
        for (kind, locator) in items {
            let reference = match self.transport.media_url(locator).await {
                Ok(url) => url,
                Err(e) => {
                    debug!(locator = %locator, error = %e, "media link unavailable, using locator");
                    locator.0.clone()
                }
            };
            refs.push(MediaRef { kind, reference });
        }
        refs
    }

    async fn store_text(
        &self,
        folder: &str,
        date: NaiveDate,
        correlation: &CorrelationId,
        text: &str,
        media: &[MediaRef],
    ) -> Result<RemoteArtifact, KeepsakeError> {
        let parent = self.resolver.resolve(folder, date, correlation).await?;
        let backend = self.resolver.backend();
        let now = self.clock.now();

        if self.settings.rich_documents {
            let doc = backend
                .create_document(&document::document_title(now), &parent)
                .await?;
            backend
                .append_text(&doc.id, &document::rich_document_body(text, media, now))
                .await?;
            Ok(doc)
        } else {
            backend
                .upload_blob(BlobUpload {
                    parent,
                    name: document::text_file_name(now),
                    bytes: document::plain_text_body(text).into_bytes(),
                    mime_type: "text/plain".to_string(),
                    description: None,
                })
                .await
        }
    }

    async fn store_media(
        &self,
        kind: MediaKind,
        folder: &str,
        date: NaiveDate,
        correlation: &CorrelationId,
        locator: &MediaLocator,
        caption: Option<String>,
    ) -> Result<RemoteArtifact, KeepsakeError> {
        let bytes = self.transport.fetch_media(locator).await?;
        if kind == MediaKind::Video && bytes.len() as u64 > self.settings.max_video_bytes {
            return Err(KeepsakeError::SizeLimitExceeded {
                size: bytes.len() as u64,
                limit: self.settings.max_video_bytes,
            });
        }

        let parent = self.resolver.resolve(folder, date, correlation).await?;
        self.resolver
            .backend()
            .upload_blob(BlobUpload {
                parent,
                name: document::media_file_name(kind, self.clock.now()),
                bytes,
                mime_type: kind.mime_type().to_string(),
                description: caption,
            })
            .await
    }
}
