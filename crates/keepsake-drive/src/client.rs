// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Google Drive v3 and Docs v1 REST APIs.
//!
//! Every method is one request/response round-trip. There is no retry:
//! any transport error or non-2xx status becomes
//! [`KeepsakeError::BackendUnavailable`].

use std::time::Duration;

use keepsake_core::KeepsakeError;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, BatchUpdateRequest, DriveFile, FOLDER_MIME_TYPE, FileList, FileMetadata,
};

const DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_API_URL: &str = "https://www.googleapis.com/upload/drive/v3";
const DOCS_API_URL: &str = "https://docs.googleapis.com/v1";

/// Fields requested for every created or listed file.
const FILE_FIELDS: &str = "id,name,mimeType,webViewLink";

/// Page size used when listing a folder's children.
const LIST_PAGE_SIZE: &str = "100";

/// Low-level Drive/Docs client.
#[derive(Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    drive_url: String,
    upload_url: String,
    docs_url: String,
}

impl DriveClient {
    /// Creates a client that authenticates every request with `access_token`.
    pub fn new(access_token: &SecretString, timeout: Duration) -> Result<Self, KeepsakeError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token.expose_secret()))
            .map_err(|e| KeepsakeError::Config(format!("invalid Drive access token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| KeepsakeError::BackendUnavailable {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            drive_url: DRIVE_API_URL.to_string(),
            upload_url: UPLOAD_API_URL.to_string(),
            docs_url: DOCS_API_URL.to_string(),
        })
    }

    /// Points all three APIs at `base` (a mock server).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.drive_url = format!("{base}/drive/v3");
        self.upload_url = format!("{base}/upload/drive/v3");
        self.docs_url = format!("{base}/v1");
        self
    }

    /// First non-trashed folder named `name` directly under `parent`.
    pub async fn find_folder(
        &self,
        parent: &str,
        name: &str,
    ) -> Result<Option<DriveFile>, KeepsakeError> {
        let query = format!(
            "name = '{}' and mimeType = '{FOLDER_MIME_TYPE}' and '{}' in parents and trashed = false",
            escape_query(name),
            escape_query(parent),
        );
        let url = self.url(
            &format!("{}/files", self.drive_url),
            &[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("pageSize", "1"),
                ("fields", "files(id,name,mimeType,webViewLink)"),
            ],
        )?;
        let list: FileList = self.execute(self.client.get(url), "folder lookup").await?;
        Ok(list.files.into_iter().next())
    }

    /// Creates a metadata-only file (folder or empty document).
    pub async fn create_file(&self, metadata: &FileMetadata) -> Result<DriveFile, KeepsakeError> {
        let url = self.url(
            &format!("{}/files", self.drive_url),
            &[("fields", FILE_FIELDS)],
        )?;
        self.execute(self.client.post(url).json(metadata), "file create")
            .await
    }

    /// Uploads `bytes` with `metadata` as a `multipart/related` request.
    pub async fn upload_multipart(
        &self,
        metadata: &FileMetadata,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<DriveFile, KeepsakeError> {
        let url = self.url(
            &format!("{}/files", self.upload_url),
            &[("uploadType", "multipart"), ("fields", FILE_FIELDS)],
        )?;
        let meta_json = serde_json::to_vec(metadata).map_err(|e| KeepsakeError::Internal(
            format!("failed to encode upload metadata: {e}"),
        ))?;
        let boundary = format!("keepsake-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &meta_json, mime_type, bytes);

        debug!(name = metadata.name.as_str(), size = bytes.len(), "uploading file");
        let request = self
            .client
            .post(url)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);
        self.execute(request, "file upload").await
    }

    /// Appends `text` to the end of a Docs document body.
    pub async fn append_document_text(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<(), KeepsakeError> {
        let url = self.url(
            &format!("{}/documents/{document_id}:batchUpdate", self.docs_url),
            &[],
        )?;
        let _: serde_json::Value = self
            .execute(
                self.client.post(url).json(&BatchUpdateRequest::append(text)),
                "document edit",
            )
            .await?;
        Ok(())
    }

    /// All non-trashed children of `parent`, following page tokens.
    pub async fn list_children(&self, parent: &str) -> Result<Vec<DriveFile>, KeepsakeError> {
        let query = format!("'{}' in parents and trashed = false", escape_query(parent));
        let fields = "nextPageToken,files(id,name,mimeType,webViewLink)";
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("pageSize", LIST_PAGE_SIZE),
                ("fields", fields),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = self.url(&format!("{}/files", self.drive_url), &params)?;
            let page: FileList = self.execute(self.client.get(url), "folder listing").await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(files)
    }

    fn url(&self, base: &str, params: &[(&str, &str)]) -> Result<Url, KeepsakeError> {
        Url::parse_with_params(base, params).map_err(|e| KeepsakeError::BackendUnavailable {
            message: format!("invalid request URL {base}: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<T, KeepsakeError> {
        let response = request
            .send()
            .await
            .map_err(|e| KeepsakeError::BackendUnavailable {
                message: format!("{operation}: HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, operation, "drive response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "{operation}: Drive API error ({}): {}",
                    api_err.error.code, api_err.error.message
                ),
                Err(_) => format!("{operation}: API returned {status}: {body}"),
            };
            return Err(KeepsakeError::backend(message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| KeepsakeError::BackendUnavailable {
                message: format!("{operation}: failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| KeepsakeError::BackendUnavailable {
            message: format!("{operation}: failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Escapes `'` and `\` for use inside a quoted Drive query literal.
pub fn escape_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Builds a two-part `multipart/related` body: JSON metadata then media.
pub fn multipart_related_body(
    boundary: &str,
    metadata_json: &[u8],
    mime_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata_json.len() + bytes.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
