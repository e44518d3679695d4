// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the transport, storage, and relay layers.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Leading character that marks a chat text as an instruction rather than content.
pub const COMMAND_PREFIX: char = '/';

/// Name prefix of the per-batch container under a date folder.
pub const MESSAGE_FOLDER_PREFIX: &str = "message_";

/// Stable identifier for one chat. All buffering and folder selection is scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey(pub String);

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ConversationKey {
    fn from(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }
}

/// Groups every artifact produced from one batch into one remote container.
///
/// Derived from the id of the inbound message that opened the batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    /// Name of the message-level container for this batch, e.g. `message_42`.
    pub fn folder_name(&self) -> String {
        format!("{MESSAGE_FOLDER_PREFIX}{}", self.0)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transient transport reference to a media file (a Telegram `file_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaLocator(pub String);

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a message sent through the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Handle of a container (folder) in the remote hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerHandle(pub String);

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of media carried by a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// MIME type used when uploading this kind of media.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaKind::Photo => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }

    /// File extension used when naming uploaded media.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role of an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Storage,
}

// --- Transport types ---

/// Payload of an inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// Plain text content.
    Text(String),
    /// An instruction such as `/save`. `name` excludes the prefix and any `@bot` suffix.
    Command { name: String, args: String },
    /// A photo; the locator points at the largest available size.
    Photo {
        locator: MediaLocator,
        caption: Option<String>,
    },
    /// A video with the size the transport declared for it, if any.
    Video {
        locator: MediaLocator,
        caption: Option<String>,
        declared_size: Option<u64>,
    },
}

/// An inbound event delivered by a transport adapter.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Transport message id; seeds the correlation id of a new batch.
    pub id: String,
    /// Conversation the event belongs to.
    pub key: ConversationKey,
    /// Sender identifier as reported by the transport.
    pub sender_id: String,
    /// Event content.
    pub payload: EventPayload,
    /// RFC 3339 timestamp of the original message.
    pub timestamp: String,
}

/// A plain-text notification to send back to a conversation.
#[derive(Debug, Clone)]
pub struct OutboundNotification {
    pub key: ConversationKey,
    pub text: String,
}

impl OutboundNotification {
    pub fn new(key: ConversationKey, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
        }
    }
}

// --- Storage types ---

/// A file or document created in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifact {
    pub id: String,
    /// Browser link, when the backend reports one.
    pub link: Option<String>,
}

impl RemoteArtifact {
    /// The link if present, otherwise the raw id.
    pub fn display_ref(&self) -> &str {
        self.link.as_deref().unwrap_or(&self.id)
    }
}

/// An immediate child of a remote container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub is_container: bool,
}

/// A binary upload request.
#[derive(Debug, Clone)]
pub struct BlobUpload {
    pub parent: ContainerHandle,
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Stored as the file's descriptive metadata (the chat caption).
    pub description: Option<String>,
}
