//! Telegram notification channel — message sending via Bot API.

use async_trait::async_trait;
use jetstream_core::config::TelegramConfig;
use jetstream_core::error::{JetStreamError, Result};
use jetstream_core::traits::Notifier;
use serde::Deserialize;

/// Telegram notifier. When the bot token or chat id is missing the
/// channel is disabled: sends become silent no-ops and the engine
/// keeps running without pushes.
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.config.bot_token, method
        )
    }

    /// Send a Markdown text message to the configured chat.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| JetStreamError::Channel(format!("sendMessage failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| JetStreamError::Channel(format!("Invalid send response: {e}")))?;

        if !result.ok {
            return Err(JetStreamError::Channel(format!(
                "Send failed: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        if !self.config.is_configured() {
            return Ok(());
        }
        self.send_message(text).await?;
        tracing::debug!("Telegram notification sent");
        Ok(())
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}
