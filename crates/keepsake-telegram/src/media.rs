// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media lookup and download for Telegram file ids.

use keepsake_core::KeepsakeError;
use keepsake_core::types::MediaLocator;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{File, FileId};
use tracing::debug;

/// Base of the Bot API file download endpoint.
pub const FILE_API_BASE: &str = "https://api.telegram.org/file/bot";

/// Resolves a file id to its server-side file record via `getFile`.
pub async fn resolve_file(bot: &Bot, locator: &MediaLocator) -> Result<File, KeepsakeError> {
    bot.get_file(FileId(locator.0.clone()))
        .await
        .map_err(|e| KeepsakeError::TransportUnavailable {
            message: format!("failed to get file info for {locator}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Direct download URL for a resolved file path.
pub fn file_url(token: &str, file_path: &str) -> String {
    format!("{FILE_API_BASE}{token}/{file_path}")
}

/// Downloads the bytes behind `locator`.
pub async fn download(bot: &Bot, locator: &MediaLocator) -> Result<Vec<u8>, KeepsakeError> {
    let file = resolve_file(bot, locator).await?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| KeepsakeError::TransportUnavailable {
            message: format!("failed to download file {locator}: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(file_id = %locator, size = buf.len(), "downloaded file from Telegram");
    Ok(buf)
}
