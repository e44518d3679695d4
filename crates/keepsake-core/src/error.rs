// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Keepsake.

use thiserror::Error;

/// The primary error type used across adapter traits and relay operations.
#[derive(Debug, Error)]
pub enum KeepsakeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A collaborator was never configured (e.g. storage credentials missing at startup).
    #[error("{component} is not configured")]
    NotConfigured { component: String },

    /// Chat transport failures (notification send, file lookup, file download).
    #[error("transport unavailable: {message}")]
    TransportUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend failures (folder lookup/create, document edit, upload, listing).
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A video exceeded the accepted size ceiling.
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    SizeLimitExceeded { size: u64, limit: u64 },

    /// An inbound update could not be mapped to a relay event.
    #[error("invalid inbound event: {0}")]
    InvalidEvent(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeepsakeError {
    /// Shorthand for a [`KeepsakeError::BackendUnavailable`] without a source.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`KeepsakeError::TransportUnavailable`] without a source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportUnavailable {
            message: message.into(),
            source: None,
        }
    }
}
