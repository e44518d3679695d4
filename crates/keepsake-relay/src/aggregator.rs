// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending aggregator: buffers forwarded items per conversation until commit.
//!
//! The first item recorded for a conversation without a live batch opens a
//! new batch whose correlation id is that item's message id. Later items join
//! the same batch until it is drained or discarded.

use std::sync::Arc;

use keepsake_core::error::KeepsakeError;
use keepsake_core::types::{COMMAND_PREFIX, ConversationKey, CorrelationId, MediaLocator};
use tracing::debug;

use crate::recording;
use crate::session::{PendingBatch, PendingPhoto, PendingVideo, SessionStore};

/// Buffers text, photos and videos per conversation.
pub struct PendingAggregator {
    store: Arc<SessionStore>,
    max_video_bytes: u64,
}

impl PendingAggregator {
    pub fn new(store: Arc<SessionStore>, max_video_bytes: u64) -> Self {
        Self {
            store,
            max_video_bytes,
        }
    }

    /// Largest accepted video in bytes.
    pub fn max_video_bytes(&self) -> u64 {
        self.max_video_bytes
    }

    /// Buffers `text`. Text that starts with the command prefix is an
    /// instruction, not content, and is ignored. Returns whether the text
    /// was buffered.
    pub fn record_text(&self, key: &ConversationKey, origin_id: &str, text: &str) -> bool {
        if text.starts_with(COMMAND_PREFIX) {
            debug!(chat_id = %key, "ignoring command-like text");
            return false;
        }
        self.push(key, origin_id, |batch| batch.texts.push(text.to_string()));
        recording::record_item("text");
        true
    }

    /// Buffers a photo.
    pub fn record_photo(
        &self,
        key: &ConversationKey,
        origin_id: &str,
        locator: MediaLocator,
        caption: Option<String>,
    ) {
        self.push(key, origin_id, |batch| {
            batch.photos.push(PendingPhoto { locator, caption })
        });
        recording::record_item("photo");
    }

    /// Buffers a video unless its declared size exceeds the ceiling.
    ///
    /// A rejected video is not buffered and does not open a batch.
    pub fn record_video(
        &self,
        key: &ConversationKey,
        origin_id: &str,
        locator: MediaLocator,
        caption: Option<String>,
        declared_size: Option<u64>,
    ) -> Result<(), KeepsakeError> {
        if let Some(size) = declared_size
            && size > self.max_video_bytes
        {
            return Err(KeepsakeError::SizeLimitExceeded {
                size,
                limit: self.max_video_bytes,
            });
        }
        self.push(key, origin_id, |batch| {
            batch.videos.push(PendingVideo {
                locator,
                caption,
                declared_size,
            })
        });
        recording::record_item("video");
        Ok(())
    }

    /// True iff a batch exists for `key` and holds at least one item.
    pub fn has_pending(&self, key: &ConversationKey) -> bool {
        self.store
            .inspect(key, |s| s.batch.as_ref().is_some_and(|b| !b.is_empty()))
            .unwrap_or(false)
    }

    /// Number of buffered items for `key`, as `(texts, photos, videos)`.
    pub fn pending_counts(&self, key: &ConversationKey) -> (usize, usize, usize) {
        self.store
            .inspect(key, |s| {
                s.batch
                    .as_ref()
                    .map(|b| (b.texts.len(), b.photos.len(), b.videos.len()))
            })
            .flatten()
            .unwrap_or((0, 0, 0))
    }

    /// Removes and returns the whole batch for `key`, or `None` when there
    /// is none. The entry is gone afterwards, not merely emptied.
    pub fn drain(&self, key: &ConversationKey) -> Option<PendingBatch> {
        self.store.take_batch(key)
    }

    /// Drops the batch for `key` without committing it. Returns the number
    /// of discarded items.
    pub fn discard(&self, key: &ConversationKey) -> usize {
        self.drain(key).map(|b| b.item_count()).unwrap_or(0)
    }

    fn push(&self, key: &ConversationKey, origin_id: &str, add: impl FnOnce(&mut PendingBatch)) {
        self.store.with_state(key, |state| {
            let batch = state.batch.get_or_insert_with(|| {
                debug!(chat_id = %key, correlation_id = origin_id, "opening pending batch");
                PendingBatch::new(CorrelationId(origin_id.to_string()))
            });
            add(batch);
        });
    }
}
