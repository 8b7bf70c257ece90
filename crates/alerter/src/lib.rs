use crate::error::AlerterError;
use async_trait::async_trait;
use configuration::TelegramConfig;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub mod error;
pub mod messages;

pub use messages::{escape_markdown, settlement_message, startup_message};

/// A best-effort outbound message channel.
///
/// Callers log failures and carry on; a message that cannot be delivered never
/// changes simulator state. Texts are MarkdownV2, built by the `messages` helpers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), AlerterError>;
}

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// A client for sending messages to the Telegram Bot API.
pub struct TelegramAlerter {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramAlerter {
    /// Creates a new `TelegramAlerter`.
    ///
    /// Returns `None` if the token or chat_id is missing from the configuration,
    /// allowing the system to gracefully disable alerting.
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Option<Self> {
        if config.token.is_empty() || config.chat_id.is_empty() {
            tracing::warn!("Telegram alerter is not configured (missing token or chat_id).");
            return None;
        }
        let client = match Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build Telegram HTTP client. Alerting disabled.");
                return None;
            }
        };
        Some(Self {
            client,
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Sends a text message to the configured Telegram chat.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2",
        };

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramAlerter {
    async fn send(&self, text: &str) -> Result<(), AlerterError> {
        self.send_message(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_disable_alerting() {
        let config = TelegramConfig {
            token: "123:abc".to_string(),
            chat_id: String::new(),
        };
        assert!(TelegramAlerter::new(&config, Duration::from_secs(5)).is_none());
        assert!(TelegramAlerter::new(&TelegramConfig::default(), Duration::from_secs(5)).is_none());
    }

    #[test]
    fn configured_alerter_is_built() {
        let config = TelegramConfig {
            token: "123:abc".to_string(),
            chat_id: "42".to_string(),
        };
        assert!(TelegramAlerter::new(&config, Duration::from_secs(5)).is_some());
    }
}
