// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation state: the folder selection, the raw-text mode, and the
//! pending batch.
//!
//! Each conversation moves between two modes:
//! `AwaitingFolderChoice -> Collecting -> (/folder) -> AwaitingFolderChoice`.
//! The pending batch lives beside the mode and has its own lifecycle:
//! `NoBatch -> Accumulating -> (commit) -> NoBatch`. Committing never resets
//! the folder selection.
//!
//! State is held in memory only and is lost on restart.

use dashmap::DashMap;
use keepsake_core::types::{ConversationKey, CorrelationId, MediaLocator};

/// How raw text from a conversation is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationMode {
    /// The next raw text names the folder (topic) for later commits.
    #[default]
    AwaitingFolderChoice,
    /// Raw text is content and is buffered into the pending batch.
    Collecting,
}

impl std::fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationMode::AwaitingFolderChoice => write!(f, "awaiting-folder-choice"),
            ConversationMode::Collecting => write!(f, "collecting"),
        }
    }
}

/// A buffered photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPhoto {
    pub locator: MediaLocator,
    pub caption: Option<String>,
}

/// A buffered video and the size the transport declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVideo {
    pub locator: MediaLocator,
    pub caption: Option<String>,
    pub declared_size: Option<u64>,
}

/// Items forwarded by one conversation that have not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch {
    /// Set when the batch is created and never reassigned.
    pub correlation: CorrelationId,
    pub texts: Vec<String>,
    pub photos: Vec<PendingPhoto>,
    pub videos: Vec<PendingVideo>,
}

impl PendingBatch {
    /// Creates an empty batch grouped under `correlation`.
    pub fn new(correlation: CorrelationId) -> Self {
        Self {
            correlation,
            texts: Vec::new(),
            photos: Vec::new(),
            videos: Vec::new(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.texts.len() + self.photos.len() + self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// Everything the relay remembers about one conversation.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub mode: ConversationMode,
    /// Selected topic name; persists across commits.
    pub folder: Option<String>,
    /// At most one live batch. `None` means no batch, not an empty one.
    pub batch: Option<PendingBatch>,
}

/// Injected store of conversation state, keyed by conversation.
///
/// Each entry is guarded by its map shard, so a closure passed to
/// [`with_state`](Self::with_state) runs with exclusive access to that key.
#[derive(Debug, Default)]
pub struct SessionStore {
    conversations: DashMap<ConversationKey, ConversationState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the state for `key`, creating a
    /// default entry when none exists.
    pub fn with_state<R>(
        &self,
        key: &ConversationKey,
        f: impl FnOnce(&mut ConversationState) -> R,
    ) -> R {
        let mut entry = self.conversations.entry(key.clone()).or_default();
        f(entry.value_mut())
    }

    /// Runs `f` against the existing state for `key` without creating one.
    pub fn inspect<R>(
        &self,
        key: &ConversationKey,
        f: impl FnOnce(&ConversationState) -> R,
    ) -> Option<R> {
        self.conversations.get(key).map(|entry| f(entry.value()))
    }

    /// Atomically removes the batch for `key`, leaving the rest of its state.
    pub fn take_batch(&self, key: &ConversationKey) -> Option<PendingBatch> {
        self.conversations
            .get_mut(key)
            .and_then(|mut entry| entry.batch.take())
    }

    /// Current mode; conversations the store has never seen await a folder choice.
    pub fn mode(&self, key: &ConversationKey) -> ConversationMode {
        self.inspect(key, |s| s.mode).unwrap_or_default()
    }

    pub fn folder(&self, key: &ConversationKey) -> Option<String> {
        self.inspect(key, |s| s.folder.clone()).flatten()
    }

    /// Selects `name` as the topic for `key` and switches to collecting.
    pub fn select_folder(&self, key: &ConversationKey, name: impl Into<String>) {
        let name = name.into();
        self.with_state(key, |s| {
            s.folder = Some(name);
            s.mode = ConversationMode::Collecting;
        });
    }

    /// Makes the next raw text from `key` a folder choice. The current
    /// selection is kept until it is replaced.
    pub fn await_folder_choice(&self, key: &ConversationKey) {
        self.with_state(key, |s| s.mode = ConversationMode::AwaitingFolderChoice);
    }

    /// Every distinct topic currently selected by some conversation.
    pub fn selected_folders(&self) -> Vec<String> {
        let mut folders: Vec<String> = self
            .conversations
            .iter()
            .filter_map(|entry| entry.value().folder.clone())
            .collect();
        folders.sort();
        folders.dedup();
        folders
    }

    /// Number of conversations with any state.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
