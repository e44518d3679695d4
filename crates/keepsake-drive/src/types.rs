// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drive v3 and Docs v1 request/response types.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type Drive uses for Google Docs documents.
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Metadata sent when creating a file, folder or document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub parents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A file resource as returned with `fields=id,name,mimeType,webViewLink`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

/// One page of `files.list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Body of `documents.batchUpdate`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<DocsRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocsRequest {
    InsertText(InsertText),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertText {
    pub text: String,
    pub end_of_segment_location: EndOfSegmentLocation,
}

/// Empty location: the end of the document body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EndOfSegmentLocation {}

impl BatchUpdateRequest {
    /// A single append of `text` at the end of the body.
    pub fn append(text: &str) -> Self {
        Self {
            requests: vec![DocsRequest::InsertText(InsertText {
                text: text.to_string(),
                end_of_segment_location: EndOfSegmentLocation::default(),
            })],
        }
    }
}

/// Google API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
