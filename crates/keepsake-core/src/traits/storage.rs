// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage backend trait for the remote document store.

use async_trait::async_trait;

use crate::error::KeepsakeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{BlobUpload, ContainerHandle, RemoteArtifact, RemoteEntry};

/// Capabilities the relay needs from the remote document store.
///
/// Every call is a single request/response round-trip. Implementations
/// report failures as [`KeepsakeError::BackendUnavailable`].
#[async_trait]
pub trait StorageBackend: PluginAdapter {
    /// Returns the first non-trashed container named exactly `name` directly
    /// under `parent`, creating one when none exists.
    async fn find_or_create_named(
        &self,
        parent: &ContainerHandle,
        name: &str,
    ) -> Result<ContainerHandle, KeepsakeError>;

    /// Creates an empty rich document titled `title` under `parent`.
    async fn create_document(
        &self,
        title: &str,
        parent: &ContainerHandle,
    ) -> Result<RemoteArtifact, KeepsakeError>;

    /// Appends text to the end of a document created by [`create_document`](Self::create_document).
    async fn append_text(&self, document_id: &str, text: &str) -> Result<(), KeepsakeError>;

    /// Uploads a binary file.
    async fn upload_blob(&self, upload: BlobUpload) -> Result<RemoteArtifact, KeepsakeError>;

    /// Lists the non-trashed immediate children of `parent`.
    async fn list_children(
        &self,
        parent: &ContainerHandle,
    ) -> Result<Vec<RemoteEntry>, KeepsakeError>;
}
