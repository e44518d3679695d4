// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for the chat platform the bot listens on.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, MediaLocator, MessageId, OutboundNotification};

/// Adapter for the chat transport.
///
/// Delivers inbound events, turns transient media locators into bytes,
/// and sends plain-text notifications back to a conversation.
#[async_trait]
pub trait TransportAdapter: PluginAdapter {
    /// Starts receiving updates from the platform.
    async fn connect(&mut self) -> Result<(), KeepsakeError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, KeepsakeError>;

    /// Sends a plain-text notification.
    async fn send(&self, msg: OutboundNotification) -> Result<MessageId, KeepsakeError>;

    /// Resolves a media locator to a downloadable URL.
    async fn media_url(&self, locator: &MediaLocator) -> Result<String, KeepsakeError>;

    /// Downloads the bytes behind a media locator.
    async fn fetch_media(&self, locator: &MediaLocator) -> Result<Vec<u8>, KeepsakeError>;
}
