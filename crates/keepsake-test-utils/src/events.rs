// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for inbound events.

use keepsake_core::types::{ConversationKey, EventPayload, InboundEvent, MediaLocator};

fn event(chat_id: i64, id: &str, payload: EventPayload) -> InboundEvent {
    InboundEvent {
        id: id.to_string(),
        key: ConversationKey::from(chat_id),
        sender_id: chat_id.to_string(),
        payload,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Raw text from `chat_id`.
pub fn text(chat_id: i64, id: &str, text: &str) -> InboundEvent {
    event(chat_id, id, EventPayload::Text(text.to_string()))
}

/// A command such as `/save`; `name` excludes the prefix.
pub fn command(chat_id: i64, id: &str, name: &str, args: &str) -> InboundEvent {
    event(
        chat_id,
        id,
        EventPayload::Command {
            name: name.to_string(),
            args: args.to_string(),
        },
    )
}

/// A photo identified by `locator`.
pub fn photo(chat_id: i64, id: &str, locator: &str, caption: Option<&str>) -> InboundEvent {
    event(
        chat_id,
        id,
        EventPayload::Photo {
            locator: MediaLocator(locator.to_string()),
            caption: caption.map(str::to_string),
        },
    )
}

/// A video without caption and with the given declared size.
pub fn video(chat_id: i64, id: &str, locator: &str, declared_size: Option<u64>) -> InboundEvent {
    event(
        chat_id,
        id,
        EventPayload::Video {
            locator: MediaLocator(locator.to_string()),
            caption: None,
            declared_size,
        },
    )
}
