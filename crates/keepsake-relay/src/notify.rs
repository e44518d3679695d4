// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notifications that never fail the caller.

use keepsake_core::TransportAdapter;
use keepsake_core::types::{ConversationKey, OutboundNotification};
use tracing::warn;

/// Sends `text` to `key`. A send failure is logged and swallowed; callers
/// carry on exactly as if the notification had been delivered.
pub async fn notify_quietly(
    transport: &(dyn TransportAdapter + Send + Sync),
    key: &ConversationKey,
    text: impl Into<String>,
) {
    if let Err(e) = transport
        .send(OutboundNotification::new(key.clone(), text))
        .await
    {
        warn!(chat_id = %key, error = %e, "failed to send notification");
    }
}
