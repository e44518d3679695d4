// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport adapter for deterministic testing.
//!
//! `MockTransport` implements `TransportAdapter` with injectable inbound events,
//! captured outbound notifications, scripted media bytes, and failure switches.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use keepsake_core::KeepsakeError;
use keepsake_core::traits::adapter::PluginAdapter;
use keepsake_core::traits::transport::TransportAdapter;
use keepsake_core::types::{
    AdapterType, HealthStatus, InboundEvent, MediaLocator, MessageId, OutboundNotification,
};

/// A mock chat transport for testing.
///
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: notifications passed to `send()` are captured for assertions
/// - **media**: bytes served by `fetch_media()`; unknown locators get
///   `mock-media:<locator>`
pub struct MockTransport {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<OutboundNotification>>>,
    notify: Arc<Notify>,
    media: Mutex<HashMap<String, Vec<u8>>>,
    failing_media: Mutex<HashSet<String>>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
}

impl MockTransport {
    /// Create a new mock transport with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            media: Mutex::new(HashMap::new()),
            failing_media: Mutex::new(HashSet::new()),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// After the queue empties, `receive()` reports the transport as closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Serve `bytes` for `locator`.
    pub async fn set_media(&self, locator: &str, bytes: Vec<u8>) {
        self.media.lock().await.insert(locator.to_string(), bytes);
    }

    /// Make both link resolution and download fail for `locator`.
    pub async fn fail_media(&self, locator: &str) {
        self.failing_media.lock().await.insert(locator.to_string());
    }

    /// Make every `send()` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// All notifications that were sent through `send()`.
    pub async fn sent_notifications(&self) -> Vec<OutboundNotification> {
        self.sent.lock().await.clone()
    }

    /// Text of every sent notification, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|n| n.text.clone()).collect()
    }

    /// Clear all captured notifications.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    async fn check_media(&self, locator: &MediaLocator) -> Result<(), KeepsakeError> {
        if self.failing_media.lock().await.contains(&locator.0) {
            return Err(KeepsakeError::transport(format!(
                "file {locator} is unavailable"
            )));
        }
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KeepsakeError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for MockTransport {
    async fn connect(&mut self) -> Result<(), KeepsakeError> {
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, KeepsakeError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Err(KeepsakeError::transport("transport closed"));
                }
            }
            self.notify.notified().await;
        }
    }

    async fn send(&self, msg: OutboundNotification) -> Result<MessageId, KeepsakeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(KeepsakeError::transport("send failed"));
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn media_url(&self, locator: &MediaLocator) -> Result<String, KeepsakeError> {
        self.check_media(locator).await?;
        Ok(format!("https://files.mock/{locator}"))
    }

    async fn fetch_media(&self, locator: &MediaLocator) -> Result<Vec<u8>, KeepsakeError> {
        self.check_media(locator).await?;
        Ok(self
            .media
            .lock()
            .await
            .get(&locator.0)
            .cloned()
            .unwrap_or_else(|| format!("mock-media:{locator}").into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use keepsake_core::types::{ConversationKey, EventPayload};

    #[tokio::test]
    async fn receive_returns_injected_events() {
        let transport = MockTransport::new();
        transport.inject(events::text(7, "1", "hello")).await;

        let received = transport.receive().await.unwrap();
        assert_eq!(received.key, ConversationKey::from(7));
        assert_eq!(received.payload, EventPayload::Text("hello".into()));
    }

    #[tokio::test]
    async fn receive_reports_closed_after_queue_drains() {
        let transport = MockTransport::new();
        transport.inject(events::text(7, "1", "hello")).await;
        transport.close();
        assert!(transport.receive().await.is_ok());
        let err = transport.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn send_captures_notifications() {
        let transport = MockTransport::new();
        let id = transport
            .send(OutboundNotification::new(ConversationKey::from(7), "saved"))
            .await
            .unwrap();
        assert!(id.0.starts_with("mock-msg-"));
        assert_eq!(transport.sent_texts().await, vec!["saved"]);
    }

    #[tokio::test]
    async fn failing_sends_capture_nothing() {
        let transport = MockTransport::new();
        transport.fail_sends(true);
        assert!(
            transport
                .send(OutboundNotification::new(ConversationKey::from(7), "x"))
                .await
                .is_err()
        );
        assert!(transport.sent_texts().await.is_empty());
    }

    #[tokio::test]
    async fn media_is_scripted_or_defaulted() {
        let transport = MockTransport::new();
        transport.set_media("P1", vec![1, 2, 3]).await;
        let p1 = MediaLocator("P1".into());
        let p2 = MediaLocator("P2".into());
        assert_eq!(transport.fetch_media(&p1).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(transport.fetch_media(&p2).await.unwrap(), b"mock-media:P2");
        assert_eq!(
            transport.media_url(&p1).await.unwrap(),
            "https://files.mock/P1"
        );

        transport.fail_media("P1").await;
        assert!(transport.fetch_media(&p1).await.is_err());
        assert!(transport.media_url(&p1).await.is_err());
    }

    #[tokio::test]
    async fn connect_succeeds() {
        let mut transport = MockTransport::new();
        assert!(transport.connect().await.is_ok());
        assert_eq!(transport.adapter_type(), AdapterType::Transport);
    }
}
