// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level handling of inbound events.
//!
//! Commands are matched by name. Raw text is a folder choice while the
//! conversation awaits one and content otherwise. Media is content whatever
//! the mode. A `/save` drains the batch here and hands the upload work back
//! to the caller as a [`CommitTask`], so uploads never hold up the next event.

use std::sync::Arc;

use keepsake_core::TransportAdapter;
use keepsake_core::error::KeepsakeError;
use keepsake_core::types::{
    COMMAND_PREFIX, ConversationKey, EventPayload, InboundEvent, MediaLocator,
};
use tracing::{debug, info};

use crate::aggregator::PendingAggregator;
use crate::commit::{CommitPipeline, CommitTask};
use crate::notify::notify_quietly;
use crate::session::{ConversationMode, SessionStore};

const HELP_TEXT: &str = "Forward me text, photos or videos and I will save them to Google Drive.\n\
\n\
/folder <name> - choose the folder to save into (or send /folder, then the name)\n\
/save - upload everything forwarded since the last save\n\
/cancel - drop everything forwarded since the last save\n\
/status - show the current folder and pending items\n\
/help - show this message";

const CHOOSE_FOLDER_PROMPT: &str =
    "Send the name of the folder to save into, for example: Diary";

const NOT_CONFIGURED: &str = "Storage is not configured, so nothing can be saved right now.";

/// Routes inbound events to the session store, aggregator and pipeline.
pub struct Dispatcher {
    store: Arc<SessionStore>,
    aggregator: Arc<PendingAggregator>,
    transport: Arc<dyn TransportAdapter + Send + Sync>,
    /// `None` when storage credentials were missing at startup.
    pipeline: Option<Arc<CommitPipeline>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<SessionStore>,
        aggregator: Arc<PendingAggregator>,
        transport: Arc<dyn TransportAdapter + Send + Sync>,
        pipeline: Option<Arc<CommitPipeline>>,
    ) -> Self {
        Self {
            store,
            aggregator,
            transport,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> Option<&Arc<CommitPipeline>> {
        self.pipeline.as_ref()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Handles one event. Returns the drained batch when the event started a
    /// commit; the caller runs it with [`CommitPipeline::finish`].
    pub async fn handle(&self, event: InboundEvent) -> Option<CommitTask> {
        let InboundEvent {
            id, key, payload, ..
        } = event;

        match payload {
            EventPayload::Command { name, args } => {
                self.handle_command(&key, &name, args.trim()).await
            }
            EventPayload::Text(text) => {
                self.handle_text(&key, &id, &text).await;
                None
            }
            EventPayload::Photo { locator, caption } => {
                self.handle_photo(&key, &id, locator, caption).await;
                None
            }
            EventPayload::Video {
                locator,
                caption,
                declared_size,
            } => {
                self.handle_video(&key, &id, locator, caption, declared_size)
                    .await;
                None
            }
        }
    }

    async fn handle_command(
        &self,
        key: &ConversationKey,
        name: &str,
        args: &str,
    ) -> Option<CommitTask> {
        debug!(chat_id = %key, command = name, "handling command");
        match name {
            "start" | "help" => self.reply(key, HELP_TEXT).await,
            "folder" => {
                if args.is_empty() {
                    self.store.await_folder_choice(key);
                    self.reply(key, CHOOSE_FOLDER_PROMPT).await;
                } else {
                    self.choose_folder(key, args).await;
                }
            }
            "save" => return self.begin_commit(key).await,
            "cancel" => {
                let dropped = self.aggregator.discard(key);
                let text = if dropped == 0 {
                    "Nothing to cancel.".to_string()
                } else {
                    format!("Dropped {dropped} pending item(s).")
                };
                self.reply(key, text).await;
            }
            "status" => self.reply(key, self.status_text(key)).await,
            other => {
                self.reply(
                    key,
                    format!("Unknown command /{other}. Send /help to see what I can do."),
                )
                .await
            }
        }
        None
    }

    async fn handle_text(&self, key: &ConversationKey, id: &str, text: &str) {
        match self.store.mode(key) {
            ConversationMode::AwaitingFolderChoice => self.choose_folder(key, text).await,
            ConversationMode::Collecting => {
                if self.pipeline.is_none() {
                    self.reply(key, NOT_CONFIGURED).await;
                } else if self.aggregator.record_text(key, id, text) {
                    self.acknowledge(key, "Text").await;
                }
            }
        }
    }

    async fn handle_photo(
        &self,
        key: &ConversationKey,
        id: &str,
        locator: MediaLocator,
        caption: Option<String>,
    ) {
        if self.pipeline.is_none() {
            self.reply(key, NOT_CONFIGURED).await;
            return;
        }
        self.aggregator.record_photo(key, id, locator, caption);
        self.acknowledge(key, "Photo").await;
    }

    async fn handle_video(
        &self,
        key: &ConversationKey,
        id: &str,
        locator: MediaLocator,
        caption: Option<String>,
        declared_size: Option<u64>,
    ) {
        if self.pipeline.is_none() {
            self.reply(key, NOT_CONFIGURED).await;
            return;
        }
        match self
            .aggregator
            .record_video(key, id, locator, caption, declared_size)
        {
            Ok(()) => self.acknowledge(key, "Video").await,
            Err(e @ KeepsakeError::SizeLimitExceeded { .. }) => {
                info!(chat_id = %key, error = %e, "video rejected");
                self.reply(key, format!("Video rejected: {e}.")).await;
            }
            Err(e) => self.reply(key, format!("Video not added: {e}.")).await,
        }
    }

    async fn choose_folder(&self, key: &ConversationKey, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.reply(key, CHOOSE_FOLDER_PROMPT).await;
            return;
        }
        if name.starts_with(COMMAND_PREFIX) {
            self.store.await_folder_choice(key);
            self.reply(
                key,
                format!("Folder names cannot start with {COMMAND_PREFIX}. {CHOOSE_FOLDER_PROMPT}"),
            )
            .await;
            return;
        }
        self.store.select_folder(key, name);
        info!(chat_id = %key, folder = name, "folder selected");
        self.reply(
            key,
            format!("Folder set to \"{name}\". Forward text, photos or videos, then send /save."),
        )
        .await;
    }

    async fn begin_commit(&self, key: &ConversationKey) -> Option<CommitTask> {
        let Some(pipeline) = &self.pipeline else {
            self.reply(key, NOT_CONFIGURED).await;
            return None;
        };
        let Some(folder) = self.store.folder(key) else {
            // Keep the batch; the next raw text picks the folder.
            self.store.await_folder_choice(key);
            self.reply(key, format!("Choose a folder first. {CHOOSE_FOLDER_PROMPT}"))
                .await;
            return None;
        };
        self.store.select_folder(key, folder.as_str());

        match pipeline.begin(key, &folder).await {
            Some(task) => Some(task),
            None => {
                pipeline.report_nothing_pending(key, &folder).await;
                None
            }
        }
    }

    async fn acknowledge(&self, key: &ConversationKey, what: &str) {
        let (texts, photos, videos) = self.aggregator.pending_counts(key);
        let pending = texts + photos + videos;
        let folder = self.store.folder(key).unwrap_or_else(|| "a folder".to_string());
        self.reply(
            key,
            format!("{what} added ({pending} pending). Send /save to upload to {folder}."),
        )
        .await;
    }

    fn status_text(&self, key: &ConversationKey) -> String {
        let folder = self
            .store
            .folder(key)
            .map(|f| format!("\"{f}\""))
            .unwrap_or_else(|| "not chosen".to_string());
        let (texts, photos, videos) = self.aggregator.pending_counts(key);
        format!(
            "Folder: {folder}\nPending: {texts} text(s), {photos} photo(s), {videos} video(s)"
        )
    }

    async fn reply(&self, key: &ConversationKey, text: impl Into<String>) {
        notify_quietly(self.transport.as_ref(), key, text).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitSettings;
    use crate::clock::FixedClock;
    use crate::resolver::FolderResolver;
    use chrono::NaiveDate;
    use keepsake_test_utils::{MockDrive, MockTransport, events};

    const LIMIT: u64 = 50 * 1024 * 1024;

    struct Fixture {
        dispatcher: Dispatcher,
        transport: Arc<MockTransport>,
        aggregator: Arc<PendingAggregator>,
        store: Arc<SessionStore>,
    }

    fn fixture(with_storage: bool) -> Fixture {
        let store = Arc::new(SessionStore::new());
        let aggregator = Arc::new(PendingAggregator::new(store.clone(), LIMIT));
        let transport = Arc::new(MockTransport::new());
        let pipeline = with_storage.then(|| {
            let drive = Arc::new(MockDrive::new());
            Arc::new(CommitPipeline::new(
                aggregator.clone(),
                Arc::new(FolderResolver::new(drive.clone(), drive.root())),
                transport.clone(),
                Arc::new(FixedClock(
                    NaiveDate::from_ymd_opt(2026, 10, 18)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap(),
                )),
                CommitSettings {
                    rich_documents: true,
                    max_video_bytes: LIMIT,
                },
            ))
        });
        Fixture {
            dispatcher: Dispatcher::new(
                store.clone(),
                aggregator.clone(),
                transport.clone(),
                pipeline,
            ),
            transport,
            aggregator,
            store,
        }
    }

    fn key() -> ConversationKey {
        ConversationKey::from(1)
    }

    async fn last_reply(transport: &MockTransport) -> String {
        transport.sent_texts().await.pop().unwrap_or_default()
    }

    #[tokio::test]
    async fn first_raw_text_selects_folder() {
        let f = fixture(true);
        f.dispatcher.handle(events::text(1, "10", "Diary")).await;
        assert_eq!(f.store.folder(&key()).as_deref(), Some("Diary"));
        assert!(!f.aggregator.has_pending(&key()));
        assert!(last_reply(&f.transport).await.starts_with("Folder set to \"Diary\""));
    }

    #[tokio::test]
    async fn text_after_selection_is_content() {
        let f = fixture(true);
        f.dispatcher.handle(events::text(1, "10", "Diary")).await;
        f.dispatcher.handle(events::text(1, "11", "hello")).await;
        assert!(f.aggregator.has_pending(&key()));
        assert_eq!(
            last_reply(&f.transport).await,
            "Text added (1 pending). Send /save to upload to Diary."
        );
    }

    #[tokio::test]
    async fn folder_command_with_argument_selects_directly() {
        let f = fixture(true);
        f.dispatcher
            .handle(events::command(1, "10", "folder", "Travel 2026"))
            .await;
        assert_eq!(f.store.folder(&key()).as_deref(), Some("Travel 2026"));
        assert_eq!(f.store.mode(&key()), ConversationMode::Collecting);
    }

    #[tokio::test]
    async fn folder_command_without_argument_awaits_choice() {
        let f = fixture(true);
        f.dispatcher.handle(events::text(1, "10", "Diary")).await;
        f.dispatcher
            .handle(events::command(1, "11", "folder", ""))
            .await;
        assert_eq!(f.store.mode(&key()), ConversationMode::AwaitingFolderChoice);
        f.dispatcher.handle(events::text(1, "12", "Travel")).await;
        assert_eq!(f.store.folder(&key()).as_deref(), Some("Travel"));
    }

    #[tokio::test]
    async fn command_like_text_is_not_a_folder_name() {
        let f = fixture(true);
        for text in ["/", "/@keepsake_bot", " /Diary"] {
            f.dispatcher.handle(events::text(1, "10", text)).await;
            assert_eq!(f.store.folder(&key()), None);
            assert_eq!(f.store.mode(&key()), ConversationMode::AwaitingFolderChoice);
            assert!(last_reply(&f.transport).await.starts_with("Folder names cannot start with /."));
        }

        f.dispatcher
            .handle(events::command(1, "11", "folder", "/tmp"))
            .await;
        assert_eq!(f.store.folder(&key()), None);

        f.dispatcher.handle(events::text(1, "12", "Diary")).await;
        assert_eq!(f.store.folder(&key()).as_deref(), Some("Diary"));
    }

    #[tokio::test]
    async fn media_is_buffered_before_folder_choice() {
        let f = fixture(true);
        f.dispatcher.handle(events::photo(1, "10", "P1", None)).await;
        assert!(f.aggregator.has_pending(&key()));
    }

    #[tokio::test]
    async fn save_without_folder_keeps_batch_and_prompts() {
        let f = fixture(true);
        f.dispatcher.handle(events::photo(1, "10", "P1", None)).await;
        let task = f
            .dispatcher
            .handle(events::command(1, "11", "save", ""))
            .await;
        assert!(task.is_none());
        assert!(f.aggregator.has_pending(&key()));
        assert!(last_reply(&f.transport).await.starts_with("Choose a folder first."));
    }

    #[tokio::test]
    async fn save_drains_and_returns_task() {
        let f = fixture(true);
        f.dispatcher.handle(events::text(1, "10", "Diary")).await;
        f.dispatcher.handle(events::text(1, "11", "hello")).await;
        let task = f
            .dispatcher
            .handle(events::command(1, "12", "save", ""))
            .await
            .unwrap();
        assert_eq!(task.folder, "Diary");
        assert_eq!(task.batch.correlation.0, "11");
        assert!(!f.aggregator.has_pending(&key()));
    }

    #[tokio::test]
    async fn save_with_nothing_pending_replies() {
        let f = fixture(true);
        f.dispatcher.handle(events::text(1, "10", "Diary")).await;
        let task = f
            .dispatcher
            .handle(events::command(1, "11", "save", ""))
            .await;
        assert!(task.is_none());
        assert!(last_reply(&f.transport).await.starts_with("Nothing to save yet"));
    }

    #[tokio::test]
    async fn oversized_video_rejected_with_message() {
        let f = fixture(true);
        f.dispatcher
            .handle(events::video(1, "10", "V1", Some(60 * 1024 * 1024)))
            .await;
        assert!(!f.aggregator.has_pending(&key()));
        assert_eq!(
            last_reply(&f.transport).await,
            "Video rejected: file size 62914560 bytes exceeds the 52428800 byte limit."
        );
    }

    #[tokio::test]
    async fn cancel_drops_pending_items() {
        let f = fixture(true);
        f.dispatcher.handle(events::photo(1, "10", "P1", None)).await;
        f.dispatcher
            .handle(events::command(1, "11", "cancel", ""))
            .await;
        assert!(!f.aggregator.has_pending(&key()));
        assert_eq!(last_reply(&f.transport).await, "Dropped 1 pending item(s).");
    }

    #[tokio::test]
    async fn status_reports_folder_and_counts() {
        let f = fixture(true);
        f.dispatcher.handle(events::text(1, "10", "Diary")).await;
        f.dispatcher.handle(events::photo(1, "11", "P1", None)).await;
        f.dispatcher
            .handle(events::command(1, "12", "status", ""))
            .await;
        assert_eq!(
            last_reply(&f.transport).await,
            "Folder: \"Diary\"\nPending: 0 text(s), 1 photo(s), 0 video(s)"
        );
    }

    #[tokio::test]
    async fn unknown_command_points_to_help() {
        let f = fixture(true);
        f.dispatcher
            .handle(events::command(1, "10", "frobnicate", ""))
            .await;
        assert!(last_reply(&f.transport).await.starts_with("Unknown command /frobnicate."));
    }

    #[tokio::test]
    async fn without_storage_content_is_not_configured() {
        let f = fixture(false);
        f.dispatcher.handle(events::text(1, "10", "Diary")).await;
        f.dispatcher.handle(events::text(1, "11", "hello")).await;
        assert_eq!(last_reply(&f.transport).await, NOT_CONFIGURED);
        f.dispatcher.handle(events::photo(1, "12", "P1", None)).await;
        assert_eq!(last_reply(&f.transport).await, NOT_CONFIGURED);
        let task = f
            .dispatcher
            .handle(events::command(1, "13", "save", ""))
            .await;
        assert!(task.is_none());
        assert_eq!(last_reply(&f.transport).await, NOT_CONFIGURED);
        assert!(!f.aggregator.has_pending(&key()));
    }

    #[tokio::test]
    async fn help_lists_commands() {
        let f = fixture(false);
        f.dispatcher
            .handle(events::command(1, "10", "start", ""))
            .await;
        let reply = last_reply(&f.transport).await;
        assert!(reply.contains("/save"));
        assert!(reply.contains("/folder"));
    }
}
