// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage backend for deterministic testing.
//!
//! `MockDrive` implements `StorageBackend` over a flat list of nodes with
//! parent links, rooted at a folder with id `root`. Every call is logged, and
//! failures can be injected per folder name, per upload call, or globally.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use keepsake_core::KeepsakeError;
use keepsake_core::traits::adapter::PluginAdapter;
use keepsake_core::traits::storage::StorageBackend;
use keepsake_core::types::{
    AdapterType, BlobUpload, ContainerHandle, HealthStatus, RemoteArtifact, RemoteEntry,
};

const ROOT_ID: &str = "root";

/// What a node in the mock tree is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Document,
    Blob,
}

/// One folder, document or file in the mock tree.
#[derive(Debug, Clone)]
pub struct MockNode {
    pub id: String,
    pub name: String,
    pub parent: String,
    pub kind: NodeKind,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub content: Vec<u8>,
}

impl MockNode {
    /// Content as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// A logged backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveCall {
    FindOrCreate { parent: String, name: String },
    CreateDocument { title: String, parent: String },
    AppendText { document_id: String },
    UploadBlob { parent: String, name: String },
    ListChildren { parent: String },
}

#[derive(Default)]
struct DriveState {
    nodes: Vec<MockNode>,
    next_id: usize,
    calls: Vec<DriveCall>,
    upload_calls: usize,
}

#[derive(Default)]
struct Failures {
    unavailable: bool,
    folders: HashSet<String>,
    upload_calls: HashSet<usize>,
}

/// An in-memory Drive.
pub struct MockDrive {
    state: Mutex<DriveState>,
    failures: Mutex<Failures>,
}

impl MockDrive {
    /// Create an empty tree containing only the root folder.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DriveState::default()),
            failures: Mutex::new(Failures::default()),
        }
    }

    /// Handle of the root folder.
    pub fn root(&self) -> ContainerHandle {
        ContainerHandle(ROOT_ID.to_string())
    }

    /// Fail every call while `unavailable` is set.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.failures.lock().await.unavailable = unavailable;
    }

    /// Fail find-or-create for folders named `name`.
    pub async fn fail_folder(&self, name: &str) {
        self.failures.lock().await.folders.insert(name.to_string());
    }

    /// Fail the `n`th `upload_blob` call (1-based, counted over the drive's lifetime).
    pub async fn fail_upload_call(&self, n: usize) {
        self.failures.lock().await.upload_calls.insert(n);
    }

    pub async fn clear_failures(&self) {
        *self.failures.lock().await = Failures::default();
    }

    /// Insert a folder without looking for an existing one, as if created elsewhere.
    pub async fn add_folder(&self, parent: &ContainerHandle, name: &str) -> ContainerHandle {
        let mut state = self.state.lock().await;
        let id = insert(&mut state, parent, name, NodeKind::Folder, None, None, Vec::new());
        ContainerHandle(id)
    }

    /// Every logged call, in order.
    pub async fn calls(&self) -> Vec<DriveCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn folder_count(&self) -> usize {
        self.nodes_of(NodeKind::Folder).await.len()
    }

    pub async fn documents(&self) -> Vec<MockNode> {
        self.nodes_of(NodeKind::Document).await
    }

    pub async fn blobs(&self) -> Vec<MockNode> {
        self.nodes_of(NodeKind::Blob).await
    }

    /// First uploaded file named `name`.
    pub async fn blob_named(&self, name: &str) -> Option<MockNode> {
        self.blobs().await.into_iter().find(|b| b.name == name)
    }

    /// Slash-joined names from below the root down to `handle`.
    pub async fn path_of(&self, handle: &ContainerHandle) -> Option<String> {
        let state = self.state.lock().await;
        path(&state, &handle.0)
    }

    /// Path of the folder holding `node`.
    pub async fn path_of_parent(&self, node: &MockNode) -> Option<String> {
        let state = self.state.lock().await;
        path(&state, &node.parent)
    }

    async fn nodes_of(&self, kind: NodeKind) -> Vec<MockNode> {
        self.state
            .lock()
            .await
            .nodes
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect()
    }

    async fn check_available(&self) -> Result<(), KeepsakeError> {
        if self.failures.lock().await.unavailable {
            return Err(KeepsakeError::backend("mock drive unavailable"));
        }
        Ok(())
    }
}

impl Default for MockDrive {
    fn default() -> Self {
        Self::new()
    }
}

fn insert(
    state: &mut DriveState,
    parent: &ContainerHandle,
    name: &str,
    kind: NodeKind,
    mime_type: Option<String>,
    description: Option<String>,
    content: Vec<u8>,
) -> String {
    state.next_id += 1;
    let id = format!("node-{}", state.next_id);
    state.nodes.push(MockNode {
        id: id.clone(),
        name: name.to_string(),
        parent: parent.0.clone(),
        kind,
        mime_type,
        description,
        content,
    });
    id
}

fn find_folder(state: &DriveState, parent: &ContainerHandle, name: &str) -> Option<String> {
    state
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Folder && n.parent == parent.0 && n.name == name)
        .map(|n| n.id.clone())
}

fn path(state: &DriveState, id: &str) -> Option<String> {
    let mut names = Vec::new();
    let mut current = id.to_string();
    while current != ROOT_ID {
        let node = state.nodes.iter().find(|n| n.id == current)?;
        names.push(node.name.clone());
        current = node.parent.clone();
    }
    names.reverse();
    Some(names.join("/"))
}

fn link(kind: NodeKind, id: &str) -> String {
    match kind {
        NodeKind::Document => format!("https://docs.mock/{id}"),
        _ => format!("https://drive.mock/{id}"),
    }
}

#[async_trait]
impl PluginAdapter for MockDrive {
    fn name(&self) -> &str {
        "mock-drive"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        if self.failures.lock().await.unavailable {
            return Ok(HealthStatus::Unhealthy("mock drive unavailable".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KeepsakeError> {
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MockDrive {
    async fn find_or_create_named(
        &self,
        parent: &ContainerHandle,
        name: &str,
    ) -> Result<ContainerHandle, KeepsakeError> {
        self.state.lock().await.calls.push(DriveCall::FindOrCreate {
            parent: parent.0.clone(),
            name: name.to_string(),
        });
        self.check_available().await?;
        if self.failures.lock().await.folders.contains(name) {
            return Err(KeepsakeError::backend(format!(
                "cannot create folder {name}"
            )));
        }

        let existing = find_folder(&*self.state.lock().await, parent, name);
        if let Some(id) = existing {
            return Ok(ContainerHandle(id));
        }

        // Lookup and create are separate round-trips against the real API.
        tokio::task::yield_now().await;

        let mut state = self.state.lock().await;
        let id = insert(&mut state, parent, name, NodeKind::Folder, None, None, Vec::new());
        Ok(ContainerHandle(id))
    }

    async fn create_document(
        &self,
        title: &str,
        parent: &ContainerHandle,
    ) -> Result<RemoteArtifact, KeepsakeError> {
        self.state.lock().await.calls.push(DriveCall::CreateDocument {
            title: title.to_string(),
            parent: parent.0.clone(),
        });
        self.check_available().await?;

        let mut state = self.state.lock().await;
        let id = insert(
            &mut state,
            parent,
            title,
            NodeKind::Document,
            Some("application/vnd.google-apps.document".into()),
            None,
            Vec::new(),
        );
        Ok(RemoteArtifact {
            link: Some(link(NodeKind::Document, &id)),
            id,
        })
    }

    async fn append_text(&self, document_id: &str, text: &str) -> Result<(), KeepsakeError> {
        self.state.lock().await.calls.push(DriveCall::AppendText {
            document_id: document_id.to_string(),
        });
        self.check_available().await?;

        let mut state = self.state.lock().await;
        let doc = state
            .nodes
            .iter_mut()
            .find(|n| n.id == document_id && n.kind == NodeKind::Document)
            .ok_or_else(|| KeepsakeError::backend(format!("document {document_id} not found")))?;
        doc.content.extend_from_slice(text.as_bytes());
        Ok(())
    }

    async fn upload_blob(&self, upload: BlobUpload) -> Result<RemoteArtifact, KeepsakeError> {
        let call_number = {
            let mut state = self.state.lock().await;
            state.calls.push(DriveCall::UploadBlob {
                parent: upload.parent.0.clone(),
                name: upload.name.clone(),
            });
            state.upload_calls += 1;
            state.upload_calls
        };
        self.check_available().await?;
        if self.failures.lock().await.upload_calls.contains(&call_number) {
            return Err(KeepsakeError::backend(format!(
                "upload of {} failed",
                upload.name
            )));
        }

        let mut state = self.state.lock().await;
        let id = insert(
            &mut state,
            &upload.parent,
            &upload.name,
            NodeKind::Blob,
            Some(upload.mime_type),
            upload.description,
            upload.bytes,
        );
        Ok(RemoteArtifact {
            link: Some(link(NodeKind::Blob, &id)),
            id,
        })
    }

    async fn list_children(
        &self,
        parent: &ContainerHandle,
    ) -> Result<Vec<RemoteEntry>, KeepsakeError> {
        self.state.lock().await.calls.push(DriveCall::ListChildren {
            parent: parent.0.clone(),
        });
        self.check_available().await?;

        let state = self.state.lock().await;
        Ok(state
            .nodes
            .iter()
            .filter(|n| n.parent == parent.0)
            .map(|n| RemoteEntry {
                id: n.id.clone(),
                name: n.name.clone(),
                is_container: n.kind == NodeKind::Folder,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_or_create_reuses_existing_folder() {
        let drive = MockDrive::new();
        let a = drive.find_or_create_named(&drive.root(), "Diary").await.unwrap();
        let b = drive.find_or_create_named(&drive.root(), "Diary").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(drive.folder_count().await, 1);
        assert_eq!(drive.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn first_duplicate_wins() {
        let drive = MockDrive::new();
        let first = drive.add_folder(&drive.root(), "Diary").await;
        drive.add_folder(&drive.root(), "Diary").await;
        let found = drive.find_or_create_named(&drive.root(), "Diary").await.unwrap();
        assert_eq!(found, first);
    }

    #[tokio::test]
    async fn documents_accumulate_text() {
        let drive = MockDrive::new();
        let doc = drive.create_document("t", &drive.root()).await.unwrap();
        drive.append_text(&doc.id, "a").await.unwrap();
        drive.append_text(&doc.id, "b").await.unwrap();
        assert_eq!(drive.documents().await[0].text(), "ab");
        assert!(doc.link.unwrap().starts_with("https://docs.mock/"));
    }

    #[tokio::test]
    async fn nth_upload_fails() {
        let drive = MockDrive::new();
        drive.fail_upload_call(2).await;
        let upload = |name: &str| BlobUpload {
            parent: drive.root(),
            name: name.to_string(),
            bytes: vec![1],
            mime_type: "video/mp4".into(),
            description: None,
        };
        assert!(drive.upload_blob(upload("a")).await.is_ok());
        assert!(drive.upload_blob(upload("b")).await.is_err());
        assert!(drive.upload_blob(upload("c")).await.is_ok());
        assert_eq!(drive.blobs().await.len(), 2);
    }

    #[tokio::test]
    async fn list_children_marks_containers() {
        let drive = MockDrive::new();
        let folder = drive.add_folder(&drive.root(), "Diary").await;
        drive.add_folder(&folder, "2026-10-18").await;
        drive
            .upload_blob(BlobUpload {
                parent: folder.clone(),
                name: "x.txt".into(),
                bytes: vec![],
                mime_type: "text/plain".into(),
                description: None,
            })
            .await
            .unwrap();
        let children = drive.list_children(&folder).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0].is_container);
        assert!(!children[1].is_container);
        assert_eq!(
            drive.path_of(&ContainerHandle(children[0].id.clone())).await.as_deref(),
            Some("Diary/2026-10-18")
        );
    }

    #[tokio::test]
    async fn unavailable_drive_fails_calls() {
        let drive = MockDrive::new();
        drive.set_unavailable(true).await;
        assert!(drive.find_or_create_named(&drive.root(), "x").await.is_err());
        assert!(matches!(
            drive.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
