// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Drive storage backend for Keepsake.
//!
//! Implements [`StorageBackend`] on the Drive v3 and Docs v1 REST APIs with
//! a pre-issued OAuth bearer token.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use keepsake_config::model::KeepsakeConfig;
use keepsake_core::traits::{PluginAdapter, StorageBackend};
use keepsake_core::types::{
    AdapterType, BlobUpload, ContainerHandle, HealthStatus, RemoteArtifact, RemoteEntry,
};
use keepsake_core::KeepsakeError;
use secrecy::SecretString;
use tracing::{debug, info};

use crate::client::DriveClient;
use crate::types::{DOCUMENT_MIME_TYPE, DriveFile, FOLDER_MIME_TYPE, FileMetadata};

/// Environment variable consulted when `drive.access_token` is unset.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_DRIVE_ACCESS_TOKEN";

/// Environment variable consulted when `drive.root_folder_id` is unset.
pub const ROOT_FOLDER_ENV: &str = "GOOGLE_DRIVE_FOLDER_ID";

/// Google Drive backend implementing [`StorageBackend`].
///
/// Access token resolution order: config -> `GOOGLE_DRIVE_ACCESS_TOKEN` -> error.
pub struct GoogleDrive {
    client: DriveClient,
    root: ContainerHandle,
}

impl GoogleDrive {
    /// Creates the backend from configuration.
    ///
    /// Fails with [`KeepsakeError::NotConfigured`] when the access token or
    /// the root folder id cannot be resolved.
    pub fn new(config: &KeepsakeConfig) -> Result<Self, KeepsakeError> {
        let token = resolve_access_token(
            config.drive.access_token.as_deref(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        )?;
        let root = resolve_root_folder(
            config.drive.root_folder_id.as_deref(),
            std::env::var(ROOT_FOLDER_ENV).ok(),
        )?;
        let client = DriveClient::new(&token, Duration::from_secs(config.drive.timeout_secs))?;

        info!(root = %root, "Google Drive backend initialized");
        Ok(Self { client, root })
    }

    /// Builds the backend around an existing client.
    pub fn with_client(client: DriveClient, root: ContainerHandle) -> Self {
        Self { client, root }
    }

    /// The folder that holds every topic folder.
    pub fn root(&self) -> &ContainerHandle {
        &self.root
    }
}

fn artifact(file: DriveFile) -> RemoteArtifact {
    RemoteArtifact {
        id: file.id,
        link: file.web_view_link,
    }
}

/// Resolves the bearer token from config, then the environment value.
pub fn resolve_access_token(
    configured: Option<&str>,
    from_env: Option<String>,
) -> Result<SecretString, KeepsakeError> {
    non_empty(configured.map(str::to_string))
        .or_else(|| non_empty(from_env))
        .map(SecretString::from)
        .ok_or_else(|| KeepsakeError::NotConfigured {
            component: format!("Google Drive access token (drive.access_token or {ACCESS_TOKEN_ENV})"),
        })
}

/// Resolves the root folder id from config, then the environment value.
pub fn resolve_root_folder(
    configured: Option<&str>,
    from_env: Option<String>,
) -> Result<ContainerHandle, KeepsakeError> {
    non_empty(configured.map(str::to_string))
        .or_else(|| non_empty(from_env))
        .map(ContainerHandle)
        .ok_or_else(|| KeepsakeError::NotConfigured {
            component: format!("Google Drive root folder (drive.root_folder_id or {ROOT_FOLDER_ENV})"),
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl PluginAdapter for GoogleDrive {
    fn name(&self) -> &str {
        "google-drive"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        match self.client.list_children(&self.root.0).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Degraded(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), KeepsakeError> {
        debug!("Google Drive backend shutting down");
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for GoogleDrive {
    async fn find_or_create_named(
        &self,
        parent: &ContainerHandle,
        name: &str,
    ) -> Result<ContainerHandle, KeepsakeError> {
        if let Some(existing) = self.client.find_folder(&parent.0, name).await? {
            debug!(parent = %parent, name, id = existing.id.as_str(), "folder found");
            return Ok(ContainerHandle(existing.id));
        }

        let created = self
            .client
            .create_file(&FileMetadata {
                name: name.to_string(),
                mime_type: Some(FOLDER_MIME_TYPE.to_string()),
                parents: vec![parent.0.clone()],
                description: None,
            })
            .await?;
        info!(parent = %parent, name, id = created.id.as_str(), "folder created");
        Ok(ContainerHandle(created.id))
    }

    async fn create_document(
        &self,
        title: &str,
        parent: &ContainerHandle,
    ) -> Result<RemoteArtifact, KeepsakeError> {
        let created = self
            .client
            .create_file(&FileMetadata {
                name: title.to_string(),
                mime_type: Some(DOCUMENT_MIME_TYPE.to_string()),
                parents: vec![parent.0.clone()],
                description: None,
            })
            .await?;
        debug!(title, id = created.id.as_str(), "document created");
        Ok(artifact(created))
    }

    async fn append_text(&self, document_id: &str, text: &str) -> Result<(), KeepsakeError> {
        self.client.append_document_text(document_id, text).await
    }

    async fn upload_blob(&self, upload: BlobUpload) -> Result<RemoteArtifact, KeepsakeError> {
        let metadata = FileMetadata {
            name: upload.name,
            mime_type: Some(upload.mime_type.clone()),
            parents: vec![upload.parent.0],
            description: upload.description,
        };
        let file = self
            .client
            .upload_multipart(&metadata, &upload.mime_type, &upload.bytes)
            .await?;
        Ok(artifact(file))
    }

    async fn list_children(
        &self,
        parent: &ContainerHandle,
    ) -> Result<Vec<RemoteEntry>, KeepsakeError> {
        let files = self.client.list_children(&parent.0).await?;
        Ok(files
            .into_iter()
            .map(|f| RemoteEntry {
                is_container: f.is_folder(),
                id: f.id,
                name: f.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn token_prefers_config() {
        let token = resolve_access_token(Some("from-config"), Some("from-env".into())).unwrap();
        assert_eq!(token.expose_secret(), "from-config");
    }

    #[test]
    fn token_falls_back_to_env_when_config_blank() {
        let token = resolve_access_token(Some("  "), Some("from-env".into())).unwrap();
        assert_eq!(token.expose_secret(), "from-env");
    }

    #[test]
    fn missing_token_is_not_configured() {
        let err = resolve_access_token(None, None).unwrap_err();
        assert!(matches!(err, KeepsakeError::NotConfigured { .. }));
        assert!(err.to_string().contains(ACCESS_TOKEN_ENV));
    }

    #[test]
    fn root_folder_resolution() {
        assert_eq!(
            resolve_root_folder(None, Some("abc".into())).unwrap(),
            ContainerHandle("abc".into())
        );
        assert!(resolve_root_folder(Some(""), None).is_err());
    }

    #[test]
    fn new_uses_configured_values() {
        let mut config = KeepsakeConfig::default();
        config.drive.access_token = Some("tok".into());
        config.drive.root_folder_id = Some("root-id".into());
        let drive = GoogleDrive::new(&config).unwrap();
        assert_eq!(drive.root(), &ContainerHandle("root-id".into()));
        assert_eq!(drive.adapter_type(), AdapterType::Storage);
    }
}
