// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end relay testing.
//!
//! `TestHarness` assembles the relay with a [`MockTransport`], a [`MockDrive`]
//! and a fixed clock. `send()` drives one event through the dispatcher and,
//! when it starts a commit, runs the commit to completion.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use keepsake_config::model::KeepsakeConfig;
use keepsake_core::types::{ConversationKey, InboundEvent};
use keepsake_core::{StorageBackend, TransportAdapter};
use keepsake_relay::{CommitReport, FixedClock, RelayComponents, StorageTarget};

use crate::mock_drive::MockDrive;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: KeepsakeConfig,
    now: NaiveDateTime,
    with_storage: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: KeepsakeConfig::default(),
            now: NaiveDate::from_ymd_opt(2026, 10, 18)
                .and_then(|d| d.and_hms_opt(10, 30, 0))
                .unwrap_or_default(),
            with_storage: true,
        }
    }

    /// Store text as rich documents (default) or plain `.txt` files.
    pub fn with_rich_documents(mut self, enabled: bool) -> Self {
        self.config.drive.rich_documents = enabled;
        self
    }

    /// Override the video size ceiling.
    pub fn with_max_video_bytes(mut self, limit: u64) -> Self {
        self.config.relay.max_video_bytes = limit;
        self
    }

    /// Fix the clock at `now`.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// Build as if storage credentials were missing at startup.
    pub fn without_storage(mut self) -> Self {
        self.with_storage = false;
        self
    }

    pub fn build(self) -> TestHarness {
        let transport = Arc::new(MockTransport::new());
        let drive = Arc::new(MockDrive::new());

        let storage = self.with_storage.then(|| StorageTarget {
            backend: drive.clone() as Arc<dyn StorageBackend + Send + Sync>,
            root: drive.root(),
        });
        let components = RelayComponents::assemble(
            &self.config,
            transport.clone() as Arc<dyn TransportAdapter + Send + Sync>,
            storage,
            Arc::new(FixedClock(self.now)),
        );

        TestHarness {
            transport,
            drive,
            components,
            now: self.now,
        }
    }
}

/// A relay wired to mock adapters.
pub struct TestHarness {
    /// The mock chat transport.
    pub transport: Arc<MockTransport>,
    /// The in-memory drive (unused by the relay when built without storage).
    pub drive: Arc<MockDrive>,
    /// Store, aggregator, pipeline, digest job and dispatcher.
    pub components: RelayComponents,
    now: NaiveDateTime,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// The instant the fixed clock reports.
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Dispatches `event`. When it starts a commit, runs the commit and
    /// returns its report.
    pub async fn send(&self, event: InboundEvent) -> Option<CommitReport> {
        let task = self.components.dispatcher.handle(event).await?;
        let pipeline = self.components.pipeline.as_ref()?;
        Some(pipeline.finish(task).await)
    }

    /// True iff `chat_id` has buffered items.
    pub fn has_pending(&self, chat_id: i64) -> bool {
        self.components
            .aggregator
            .has_pending(&ConversationKey::from(chat_id))
    }

    /// The last notification sent to any conversation.
    pub async fn last_reply(&self) -> Option<String> {
        self.transport.sent_texts().await.pop()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
