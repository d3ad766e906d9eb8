use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::config::TelegramConfig;
use crate::notify::Notifier;
use crate::utils::error::AppError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Delivers alerts through the Telegram Bot API. The destination passed to
/// `send` is the chat id.
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self::with_api_base(config, TELEGRAM_API_BASE)
    }

    /// The API base is injectable so tests can point at a local server.
    pub fn with_api_base(config: &TelegramConfig, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            bot_token: config.bot_token.clone(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<bool, AppError> {
        if self.bot_token.is_empty() {
            error!("Telegram bot token is not configured");
            return Ok(false);
        }
        if destination.is_empty() {
            error!("Telegram chat id is not configured");
            return Ok(false);
        }

        let api_url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = [
            ("chat_id", destination),
            ("text", text),
            ("parse_mode", "Markdown"),
            ("disable_web_page_preview", "false"),
        ];

        debug!(chat_id = destination, "sending Telegram message");
        let response = self
            .client
            .post(&api_url)
            .form(&payload)
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("telegram request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Notify(format!(
                "telegram returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Notify(format!("invalid telegram response: {}", e)))?;

        if body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
            info!(chat_id = destination, "message sent to Telegram");
            Ok(true)
        } else {
            let description = body
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("no description");
            error!(chat_id = destination, description, "Telegram rejected the message");
            Ok(false)
        }
    }
}
