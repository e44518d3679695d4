// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for Keepsake.
//!
//! Implements [`TransportAdapter`] for the Telegram Bot API via teloxide:
//! long polling, an allow-list filter, mapping of text, photos and videos
//! into relay events, and file downloads.

pub mod handler;
pub mod media;

use std::sync::Arc;

use async_trait::async_trait;
use keepsake_config::model::TelegramConfig;
use keepsake_core::KeepsakeError;
use keepsake_core::traits::{PluginAdapter, TransportAdapter};
use keepsake_core::types::{
    AdapterType, HealthStatus, InboundEvent, MediaLocator, MessageId, OutboundNotification,
};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Environment variable consulted when `telegram.bot_token` is unset.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Capacity of the queue between the polling task and `receive()`.
const INBOUND_QUEUE: usize = 100;

/// Telegram transport implementing [`TransportAdapter`].
///
/// Token resolution order: config -> `TELEGRAM_BOT_TOKEN` -> error.
pub struct TelegramTransport {
    bot: Bot,
    allowed_users: Arc<Vec<String>>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramTransport {
    /// Creates the transport. Polling starts on [`connect`](TransportAdapter::connect).
    pub fn new(config: &TelegramConfig) -> Result<Self, KeepsakeError> {
        let token = resolve_bot_token(config.bot_token.as_deref(), std::env::var(BOT_TOKEN_ENV).ok())?;
        if config.allowed_users.is_empty() {
            warn!("telegram.allowed_users is empty, every message will be ignored");
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE);
        Ok(Self {
            bot: Bot::new(token),
            allowed_users: Arc::new(config.allowed_users.clone()),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

/// Resolves the bot token from config, then the environment value.
pub fn resolve_bot_token(
    configured: Option<&str>,
    from_env: Option<String>,
) -> Result<String, KeepsakeError> {
    configured
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| from_env.filter(|t| !t.trim().is_empty()))
        .ok_or_else(|| {
            KeepsakeError::Config(format!(
                "Telegram bot token not found. Set telegram.bot_token in config or {BOT_TOKEN_ENV} environment variable."
            ))
        })
}

#[async_trait]
impl PluginAdapter for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, KeepsakeError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), KeepsakeError> {
        debug!("Telegram transport shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for TelegramTransport {
    async fn connect(&mut self) -> Result<(), KeepsakeError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();
        let allowed_users = self.allowed_users.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                let allowed = allowed_users.clone();
                async move {
                    if !handler::is_authorized(&msg, &allowed) {
                        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                        return respond(());
                    }

                    match handler::extract_payload(&msg) {
                        Some(payload) => {
                            let event = handler::to_inbound_event(&msg, payload);
                            if tx.send(event).await.is_err() {
                                warn!("inbound queue closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                        }
                    }

                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, KeepsakeError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| KeepsakeError::transport("Telegram inbound channel closed"))
    }

    async fn send(&self, msg: OutboundNotification) -> Result<MessageId, KeepsakeError> {
        let chat_id = msg
            .key
            .0
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| KeepsakeError::transport(format!("invalid chat id {}: {e}", msg.key)))?;

        let sent = self
            .bot
            .send_message(chat_id, msg.text)
            .await
            .map_err(|e| KeepsakeError::TransportUnavailable {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn media_url(&self, locator: &MediaLocator) -> Result<String, KeepsakeError> {
        let file = media::resolve_file(&self.bot, locator).await?;
        Ok(media::file_url(self.bot.token(), &file.path))
    }

    async fn fetch_media(&self, locator: &MediaLocator) -> Result<Vec<u8>, KeepsakeError> {
        media::download(&self.bot, locator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            allowed_users: vec!["12345".into()],
        }
    }

    #[test]
    fn token_prefers_config_then_env() {
        assert_eq!(
            resolve_bot_token(Some("cfg"), Some("env".into())).unwrap(),
            "cfg"
        );
        assert_eq!(resolve_bot_token(Some(""), Some("env".into())).unwrap(), "env");
        assert_eq!(resolve_bot_token(None, Some("env".into())).unwrap(), "env");
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = resolve_bot_token(None, Some("  ".into())).unwrap_err();
        assert!(matches!(err, KeepsakeError::Config(_)));
        assert!(err.to_string().contains(BOT_TOKEN_ENV));
    }

    #[test]
    fn new_accepts_configured_token() {
        let transport =
            TelegramTransport::new(&config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11")))
                .unwrap();
        assert_eq!(transport.bot().token(), "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11");
    }

    #[test]
    fn plugin_adapter_metadata() {
        let transport = TelegramTransport::new(&config(Some("test:token"))).unwrap();
        assert_eq!(transport.name(), "telegram");
        assert_eq!(transport.version(), semver::Version::new(0, 1, 0));
        assert_eq!(transport.adapter_type(), AdapterType::Transport);
    }

    #[tokio::test]
    async fn send_rejects_non_numeric_chat_id() {
        let transport = TelegramTransport::new(&config(Some("test:token"))).unwrap();
        let err = transport
            .send(OutboundNotification::new(
                keepsake_core::ConversationKey("not-a-chat".into()),
                "hi",
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid chat id"));
    }
}
