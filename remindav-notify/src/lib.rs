//! Telegram notification sink: message sending via the Bot API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use remindav_core::error::{RemindError, RemindResult};
use remindav_core::gateway::NotificationSink;

const SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Sink delivering to one fixed Telegram chat.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        TelegramNotifier {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, text: &str) -> RemindResult<()> {
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .map_err(|e| RemindError::Notify(format!("sendMessage failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| RemindError::Notify(format!("invalid Telegram response: {e}")))?;

        if !result.ok {
            return Err(RemindError::Notify(format!(
                "Telegram API error: {}",
                result.description.unwrap_or_default()
            )));
        }

        debug!("notification delivered");
        Ok(())
    }
}

// --- Telegram API types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}
