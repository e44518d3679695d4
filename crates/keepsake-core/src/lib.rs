// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Keepsake.
//!
//! Provides the adapter traits, error type, and shared types used by the
//! relay, the Telegram transport, and the Drive storage backend.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KeepsakeError;
pub use types::{
    AdapterType, ContainerHandle, ConversationKey, CorrelationId, HealthStatus, MediaKind,
    MediaLocator, MessageId,
};

pub use traits::{PluginAdapter, StorageBackend, TransportAdapter};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::types::RemoteArtifact;

    #[test]
    fn error_messages_name_the_failure() {
        let err = KeepsakeError::SizeLimitExceeded {
            size: 60,
            limit: 50,
        };
        assert_eq!(
            err.to_string(),
            "file size 60 bytes exceeds the 50 byte limit"
        );

        let err = KeepsakeError::NotConfigured {
            component: "storage backend".into(),
        };
        assert_eq!(err.to_string(), "storage backend is not configured");

        let err = KeepsakeError::backend("list failed");
        assert!(matches!(err, KeepsakeError::BackendUnavailable { source: None, .. }));
        assert_eq!(err.to_string(), "backend unavailable: list failed");

        let err = KeepsakeError::transport("send failed");
        assert_eq!(err.to_string(), "transport unavailable: send failed");
    }

    #[test]
    fn correlation_id_folder_name() {
        let id = CorrelationId("4711".into());
        assert_eq!(id.folder_name(), "message_4711");
    }

    #[test]
    fn conversation_key_from_chat_id() {
        let key = ConversationKey::from(-100123_i64);
        assert_eq!(key.to_string(), "-100123");
    }

    #[test]
    fn media_kind_display_and_parse() {
        assert_eq!(MediaKind::Photo.to_string(), "photo");
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::from_str("video").unwrap(), MediaKind::Video);
        assert_eq!(MediaKind::Photo.mime_type(), "image/jpeg");
        assert_eq!(MediaKind::Video.extension(), "mp4");
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        for variant in [AdapterType::Transport, AdapterType::Storage] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn remote_artifact_prefers_link() {
        let with_link = RemoteArtifact {
            id: "abc".into(),
            link: Some("https://drive/abc".into()),
        };
        let without = RemoteArtifact {
            id: "abc".into(),
            link: None,
        };
        assert_eq!(with_link.display_ref(), "https://drive/abc");
        assert_eq!(without.display_ref(), "abc");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_transport_adapter<T: TransportAdapter>() {}
        fn _assert_storage_backend<T: StorageBackend>() {}
    }
}
