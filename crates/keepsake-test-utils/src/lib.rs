// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keepsake integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without Telegram or Google Drive.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock chat transport with event injection and notification capture
//! - [`MockDrive`] - In-memory folder tree with a call log and failure injection
//! - [`TestHarness`] - The relay wired to both mocks with a fixed clock
//! - [`events`] - Builders for inbound events

pub mod events;
pub mod harness;
pub mod mock_drive;
pub mod mock_transport;

pub use harness::TestHarness;
pub use mock_drive::{DriveCall, MockDrive, MockNode, NodeKind};
pub use mock_transport::MockTransport;
