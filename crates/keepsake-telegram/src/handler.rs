// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization filtering and event extraction.
//!
//! Decides whether an incoming Telegram message should reach the relay and
//! maps it into a transport-agnostic [`InboundEvent`].

use keepsake_core::types::{COMMAND_PREFIX, ConversationKey, EventPayload, InboundEvent, MediaLocator};
use teloxide::types::Message;

/// Checks whether the message sender is authorized.
///
/// Authorization passes if the sender's user ID (as string) or username
/// matches any entry in the `allowed_users` list. If `allowed_users` is
/// empty, all messages are rejected.
///
/// Messages without a sender (e.g., channel posts) always return `false`.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id = user.id.0.to_string();

    allowed_users.iter().any(|allowed| {
        *allowed == user_id
            || user.username.as_deref().is_some_and(|username| {
                username.eq_ignore_ascii_case(allowed.strip_prefix('@').unwrap_or(allowed))
            })
    })
}

/// Splits `/name@bot args` into `("name", "args")`.
///
/// Returns `None` when `text` does not start with the command prefix or the
/// name is empty.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix(COMMAND_PREFIX)?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args.to_string()))
}

/// Extracts the relay payload from a message.
///
/// Text (commands included), photos and videos are supported. Photos use
/// the largest size variant. Returns `None` for anything else (stickers,
/// documents, voice notes).
pub fn extract_payload(msg: &Message) -> Option<EventPayload> {
    if let Some(text) = msg.text() {
        return Some(match parse_command(text) {
            Some((name, args)) => EventPayload::Command { name, args },
            None => EventPayload::Text(text.to_string()),
        });
    }

    let caption = msg.caption().map(str::to_string);

    if let Some(photos) = msg.photo() {
        // Telegram lists sizes smallest first.
        let largest = photos.last()?;
        return Some(EventPayload::Photo {
            locator: MediaLocator(largest.file.id.to_string()),
            caption,
        });
    }

    if let Some(video) = msg.video() {
        return Some(EventPayload::Video {
            locator: MediaLocator(video.file.id.to_string()),
            caption,
            declared_size: declared_size(video.file.size),
        });
    }

    None
}

/// Size reported by Telegram, if it reported one.
///
/// teloxide fills an absent `file_size` with `u32::MAX`.
fn declared_size(size: u32) -> Option<u64> {
    (size > 0 && size != u32::MAX).then_some(u64::from(size))
}

/// Wraps a payload with the message's routing fields.
pub fn to_inbound_event(msg: &Message, payload: EventPayload) -> InboundEvent {
    let sender_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    InboundEvent {
        id: msg.id.0.to_string(),
        key: ConversationKey::from(msg.chat.id.0),
        sender_id,
        payload,
        timestamp: msg.date.to_rfc3339(),
    }
}
